//! Context Assembler (spec §4.9, C9): for a chosen segment type, builds the
//! `(retrieval_query, retrieval_where, template_vars)` triple the Generator
//! renders its prompt from. The relaxable constraints are modelled as an
//! ordered list so a retry can progressively drop the most optional one
//! first without hand-writing a chain of `if`s per level.

use broadcast_config::ContextConfig;
use broadcast_core::{ComplexityTier, ConfidenceTier, Personality, SegmentType, Weather, WhereClause};
use broadcast_freshness::FreshnessTracker;
use broadcast_memory::{continuity_for_weather, SessionMemory, WeatherContinuity};
use broadcast_personality::tone_for_context;
use broadcast_story::StoryState;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StoryBeatContext {
    pub title: String,
    pub act_summary: String,
    pub act_number: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateVars {
    pub dj_name: String,
    pub hour: u8,
    pub weather: Weather,
    pub continuity: WeatherContinuity,
    pub notable_recent_weather: Vec<String>,
    pub story_beat: Option<StoryBeatContext>,
    pub recent_segment_summaries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssembledContext {
    pub retrieval_query: String,
    pub retrieval_where: WhereClause,
    pub template_vars: TemplateVars,
}

pub struct ContextRequest<'a> {
    pub segment_type: SegmentType,
    pub personality: &'a Personality,
    pub hour: u8,
    pub region: &'a str,
    pub weather: &'a Weather,
    pub notable_recent_weather: Vec<String>,
    pub memory: &'a SessionMemory,
    pub recent_subjects: &'a [String],
    pub story_state: Option<&'a StoryState>,
    pub story_timeline: Option<broadcast_core::Timeline>,
    pub complexity_tier: ComplexityTier,
    pub config: &'a ContextConfig,
}

fn retrieval_query_for(request: &ContextRequest) -> String {
    match request.segment_type {
        SegmentType::TimeCheck => format!("a quick time-of-day check-in, hour {}", request.hour),
        SegmentType::Weather => format!("weather and atmosphere in {}", request.region),
        SegmentType::News => format!("news-worthy recent events in {}", request.region),
        SegmentType::Story => request
            .story_state
            .zip(request.story_timeline)
            .and_then(|(state, timeline)| state.active_story(timeline))
            .map(|story| format!("continuation of the story \"{}\"", story.title))
            .unwrap_or_else(|| "a wasteland story beat".to_string()),
        SegmentType::Gossip => format!("casual gossip and rumors around {}", request.region),
    }
}

fn confidence_tiers_at_or_above(floor: &ConfidenceTier) -> Vec<String> {
    let ordered = [ConfidenceTier::Low, ConfidenceTier::Medium, ConfidenceTier::High];
    let floor_rank = ordered.iter().position(|t| t == floor).unwrap_or(0);
    ordered[floor_rank..]
        .iter()
        .map(|t| match t {
            ConfidenceTier::High => "high".to_string(),
            ConfidenceTier::Medium => "medium".to_string(),
            ConfidenceTier::Low => "low".to_string(),
        })
        .collect()
}

fn parse_confidence_floor(floor: &str) -> Option<ConfidenceTier> {
    match floor.to_lowercase().as_str() {
        "high" => Some(ConfidenceTier::High),
        "medium" => Some(ConfidenceTier::Medium),
        "low" => Some(ConfidenceTier::Low),
        _ => None,
    }
}

/// Builds the retrieval filter and its relaxable layers. The first element
/// of the returned tuple is never relaxed (personality's year/region/
/// forbidden-content constraints); the `Vec` is ordered most-disposable
/// first so [`relax`] can drop a growing prefix.
fn build_filter_layers(request: &ContextRequest) -> (WhereClause, Vec<WhereClause>) {
    let base = request.personality.base_filter();

    let mut layers = Vec::new();

    if let Some(floor) = request.config.confidence_floor.as_deref().and_then(parse_confidence_floor) {
        layers.push(WhereClause::In {
            field: "confidence_tier".to_string(),
            values: confidence_tiers_at_or_above(&floor),
        });
    }

    if !request.recent_subjects.is_empty() {
        layers.push(WhereClause::NotIn {
            field: "primary_subjects".to_string(),
            values: request.recent_subjects.to_vec(),
        });
    }

    layers.push(WhereClause::Eq {
        field: "complexity_tier".to_string(),
        value: match request.complexity_tier {
            ComplexityTier::Simple => "simple".to_string(),
            ComplexityTier::Moderate => "moderate".to_string(),
            ComplexityTier::Complex => "complex".to_string(),
        },
    });

    let tones = tone_for_context(request.weather, request.hour);
    layers.push(WhereClause::In {
        field: "emotional_tone".to_string(),
        values: tones
            .iter()
            .map(|t| format!("{t:?}").to_lowercase())
            .collect(),
    });

    layers.push(FreshnessTracker::filter_fresh(request.config.freshness_threshold));

    (base, layers)
}

/// Composes `base ∧ layers[level..]` — retry level 0 is the full
/// conjunction, each increment drops the next most disposable layer.
fn where_at_level(base: &WhereClause, layers: &[WhereClause], level: usize) -> WhereClause {
    let mut parts = vec![base.clone()];
    if level < layers.len() {
        parts.extend(layers[level..].iter().cloned());
    }
    WhereClause::and(parts)
}

/// Maximum relax level before the filter collapses to just the
/// personality's non-negotiable base filter.
pub fn max_relax_level(request: &ContextRequest) -> usize {
    build_filter_layers(request).1.len()
}

pub fn assemble(request: ContextRequest, relax_level: usize) -> AssembledContext {
    let (base, layers) = build_filter_layers(&request);
    let retrieval_where = where_at_level(&base, &layers, relax_level);
    let retrieval_query = retrieval_query_for(&request);

    let continuity = continuity_for_weather(request.memory, request.region, request.weather.kind);

    let story_beat = request
        .story_state
        .zip(request.story_timeline)
        .and_then(|(state, timeline)| {
            state.active_story(timeline).and_then(|story| {
                story.current_act().map(|act| StoryBeatContext {
                    title: story.title.clone(),
                    act_summary: act.summary.clone(),
                    act_number: act.act_number,
                })
            })
        });

    let recent_segment_summaries = request
        .memory
        .last_k(3)
        .into_iter()
        .map(|s| s.script_text.clone())
        .collect();

    AssembledContext {
        retrieval_query,
        retrieval_where,
        template_vars: TemplateVars {
            dj_name: request.personality.name.clone(),
            hour: request.hour,
            weather: request.weather.clone(),
            continuity,
            notable_recent_weather: request.notable_recent_weather.clone(),
            story_beat,
            recent_segment_summaries,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_core::WeatherType;
    use std::path::PathBuf;

    fn personality() -> Personality {
        Personality {
            name: "Julie".to_string(),
            year_dj: 2102,
            region: "appalachia".to_string(),
            forbidden_factions: vec![],
            forbidden_content_types: vec![],
            region_allow: vec!["appalachia".to_string()],
            catchphrases: vec![],
            filler_words: vec![],
            taboo_words: vec![],
            default_mood: vec![],
        }
    }

    fn weather(kind: WeatherType) -> Weather {
        Weather {
            kind,
            intensity: 0.4,
            temperature_f: 58.0,
            duration_remaining_hours: 2,
        }
    }

    #[test]
    fn relax_level_zero_keeps_every_layer() {
        let personality = personality();
        let memory = SessionMemory::new(10);
        let request = ContextRequest {
            segment_type: SegmentType::Gossip,
            personality: &personality,
            hour: 9,
            region: "appalachia",
            weather: &weather(WeatherType::Sunny),
            notable_recent_weather: vec![],
            memory: &memory,
            recent_subjects: &["raiders".to_string()],
            story_state: None,
            story_timeline: None,
            complexity_tier: ComplexityTier::Simple,
            config: &ContextConfig::default(),
        };
        let max_level = max_relax_level(&request);
        let assembled = assemble(request, 0);
        if let WhereClause::And(parts) = assembled.retrieval_where {
            assert_eq!(parts.len(), 1 + max_level);
        } else {
            panic!("expected conjunction");
        }
    }

    #[test]
    fn max_relax_level_collapses_to_base_filter_only() {
        let personality = personality();
        let memory = SessionMemory::new(10);
        let request = ContextRequest {
            segment_type: SegmentType::Gossip,
            personality: &personality,
            hour: 9,
            region: "appalachia",
            weather: &weather(WeatherType::Sunny),
            notable_recent_weather: vec![],
            memory: &memory,
            recent_subjects: &[],
            story_state: None,
            story_timeline: None,
            complexity_tier: ComplexityTier::Simple,
            config: &ContextConfig::default(),
        };
        let max_level = max_relax_level(&request);
        let assembled = assemble(request, max_level);
        assert_eq!(assembled.retrieval_where, WhereClause::and(vec![personality.base_filter()]));
    }

    #[test]
    fn story_segment_query_names_the_active_story() {
        let personality = personality();
        let memory = SessionMemory::new(10);
        let mut story_state = StoryState::new(PathBuf::from("/tmp/unused-story-state.json"));
        let acts = vec![broadcast_core::Act {
            act_number: 1,
            act_type: broadcast_core::ActType::Setup,
            summary: "Raiders approach the settlement.".to_string(),
            source_chunk_ids: vec![],
            conflict_level: 0.5,
            tone: broadcast_core::EmotionalTone::Tense,
        }];
        let story = broadcast_core::Story::new(
            broadcast_core::StoryId::new("story-siege-hollow-creek"),
            "The Siege of Hollow Creek".to_string(),
            broadcast_core::Timeline::Daily,
            2.0,
            acts,
        );
        story_state.seed(vec![story]);
        story_state.activate_next(broadcast_core::Timeline::Daily, &broadcast_config::StoryConfig::default());

        let request = ContextRequest {
            segment_type: SegmentType::Story,
            personality: &personality,
            hour: 9,
            region: "appalachia",
            weather: &weather(WeatherType::Sunny),
            notable_recent_weather: vec![],
            memory: &memory,
            recent_subjects: &[],
            story_state: Some(&story_state),
            story_timeline: Some(broadcast_core::Timeline::Daily),
            complexity_tier: ComplexityTier::Simple,
            config: &ContextConfig::default(),
        };
        let assembled = assemble(request, 0);
        assert!(assembled.retrieval_query.contains("The Siege of Hollow Creek"));
        assert!(assembled.template_vars.story_beat.is_some());
    }
}
