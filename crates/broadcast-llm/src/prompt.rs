//! Per-segment-type prompt rendering (spec §4.10): turns [`TemplateVars`]
//! plus the retrieved chunks into the textual prompt submitted to the
//! generation LLM. One small template function per segment type rather
//! than a single templating engine — matches the teacher's preference for
//! plain `format!` strings over a template dependency (no `tera`/`handlebars`
//! anywhere in its stack).

use broadcast_context::TemplateVars;
use broadcast_core::{Chunk, Personality, SegmentType};

fn chunk_excerpts(chunks: &[Chunk], max: usize) -> String {
    chunks
        .iter()
        .take(max)
        .map(|c| format!("- {}", c.body))
        .collect::<Vec<_>>()
        .join("\n")
}

fn persona_preamble(personality: &Personality) -> String {
    let catchphrase = personality.catchphrases.first().cloned().unwrap_or_default();
    format!(
        "You are {}, a radio DJ broadcasting from {} in the year {}. Catchphrase: \"{}\".",
        personality.name, personality.region, personality.year_dj, catchphrase
    )
}

pub fn render_prompt(segment_type: SegmentType, personality: &Personality, vars: &TemplateVars, chunks: &[Chunk]) -> String {
    let preamble = persona_preamble(personality);
    let lore = chunk_excerpts(chunks, 5);

    match segment_type {
        SegmentType::TimeCheck => format!(
            "{preamble}\nGive a brief time-of-day check-in for hour {}. Keep it short and in character.",
            vars.hour
        ),
        SegmentType::Weather => {
            let continuity_note = vars
                .continuity
                .transition_phrase
                .as_deref()
                .map(|p| format!(" Work in this continuity note: \"{p}\""))
                .unwrap_or_default();
            format!(
                "{preamble}\nReport the weather: {:?}, intensity {:.1}, {:.0}°F.{continuity_note}\nRelevant lore:\n{lore}",
                vars.weather.kind, vars.weather.intensity, vars.weather.temperature_f
            )
        }
        SegmentType::News => format!("{preamble}\nDeliver a news segment using this lore:\n{lore}"),
        SegmentType::Story => {
            let beat = vars
                .story_beat
                .as_ref()
                .map(|b| format!("Continue the story \"{}\" (act {}): {}", b.title, b.act_number, b.act_summary))
                .unwrap_or_else(|| "Tell a standalone wasteland story.".to_string());
            format!("{preamble}\n{beat}\nRelevant lore:\n{lore}")
        }
        SegmentType::Gossip => format!("{preamble}\nShare some casual gossip or rumors using this lore:\n{lore}"),
    }
}
