//! Behavior layered on top of [`broadcast_core::Personality`] (spec §4.3,
//! C3). `Personality` itself is pure read-only data plus `base_filter()`
//! (defined in `broadcast-core` so `Story`/`RecentSegment` types can stay
//! free of a dependency on this crate); `tone_for_context` — the mood-map
//! lookup — lives here because it is a standalone policy function, not
//! part of the data schema.

use std::path::Path;

use anyhow::{Context, Result};
use broadcast_core::{EmotionalTone, Personality, Weather, WeatherType};

/// Loads a DJ's character file from `path` (spec §6 `personality_path`,
/// `broadcast_config::DjConfig`). There is exactly one per run (spec §3
/// "Read-only within a run").
pub async fn load_from(path: impl AsRef<Path>) -> Result<Personality> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading personality file {}", path.display()))?;
    let personality = serde_json::from_str(&raw)
        .with_context(|| format!("parsing personality file {}", path.display()))?;
    Ok(personality)
}

fn is_morning(hour: u8) -> bool {
    (5..12).contains(&hour)
}

fn is_night(hour: u8) -> bool {
    !(5..20).contains(&hour)
}

/// Mood map (spec §4.3, enumerated verbatim):
/// sunny-morning→{hopeful, neutral}; rad-storm-night→{tense, tragic,
/// mysterious}; fog→{mysterious, neutral}; default→{neutral}.
pub fn tone_for_context(weather: &Weather, hour: u8) -> Vec<EmotionalTone> {
    match weather.kind {
        WeatherType::Sunny if is_morning(hour) => vec![EmotionalTone::Hopeful, EmotionalTone::Neutral],
        WeatherType::RadStorm if is_night(hour) => {
            vec![EmotionalTone::Tense, EmotionalTone::Tragic, EmotionalTone::Mysterious]
        }
        WeatherType::Fog => vec![EmotionalTone::Mysterious, EmotionalTone::Neutral],
        _ => vec![EmotionalTone::Neutral],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather(kind: WeatherType) -> Weather {
        Weather {
            kind,
            intensity: 0.5,
            temperature_f: 60.0,
            duration_remaining_hours: 2,
        }
    }

    #[test]
    fn sunny_morning_yields_hopeful_mood() {
        let tones = tone_for_context(&weather(WeatherType::Sunny), 8);
        assert!(tones.contains(&EmotionalTone::Hopeful));
    }

    #[test]
    fn sunny_evening_falls_back_to_default() {
        let tones = tone_for_context(&weather(WeatherType::Sunny), 21);
        assert_eq!(tones, vec![EmotionalTone::Neutral]);
    }

    #[test]
    fn rad_storm_at_night_is_tense() {
        let tones = tone_for_context(&weather(WeatherType::RadStorm), 23);
        assert!(tones.contains(&EmotionalTone::Tense));
    }

    #[test]
    fn fog_is_mysterious_any_hour() {
        let tones = tone_for_context(&weather(WeatherType::Fog), 14);
        assert!(tones.contains(&EmotionalTone::Mysterious));
    }

    #[tokio::test]
    async fn load_from_parses_a_personality_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("julie.json");
        tokio::fs::write(
            &path,
            r#"{
                "name": "Julie",
                "year_dj": 2102,
                "region": "appalachia",
                "forbidden_factions": ["enclave"],
                "forbidden_content_types": [],
                "region_allow": ["appalachia"],
                "catchphrases": ["Stay frosty out there"],
                "filler_words": [],
                "taboo_words": [],
                "default_mood": ["neutral"]
            }"#,
        )
        .await?;

        let personality = load_from(&path).await?;
        assert_eq!(personality.name, "Julie");
        assert_eq!(personality.year_dj, 2102);
        Ok(())
    }

    #[tokio::test]
    async fn load_from_missing_file_errors() {
        let result = load_from("/nonexistent/julie.json").await;
        assert!(result.is_err());
    }
}
