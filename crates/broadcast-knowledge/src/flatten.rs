//! Flattening of `Chunk` metadata into a scalar mapping (spec §6: the vector
//! corpus backend's metadata is a flat mapping of scalars; list-typed
//! semantic fields are flattened to indexed keys `theme_0..theme_2`,
//! `primary_subject_0..primary_subject_4`).

use std::collections::HashMap;

use broadcast_core::Chunk;

pub fn flatten_metadata(chunk: &Chunk) -> HashMap<String, String> {
    let mut map = HashMap::new();
    map.insert("year".to_string(), chunk.year.to_string());
    map.insert("region".to_string(), chunk.region.clone());
    map.insert("content_type".to_string(), chunk.content_type.clone());
    map.insert(
        "confidence_tier".to_string(),
        serde_json::to_value(chunk.confidence_tier)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default(),
    );
    map.insert(
        "emotional_tone".to_string(),
        serde_json::to_value(chunk.emotional_tone)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default(),
    );
    map.insert(
        "complexity_tier".to_string(),
        serde_json::to_value(chunk.complexity_tier)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default(),
    );
    map.insert(
        "controversy_level".to_string(),
        serde_json::to_value(chunk.controversy_level)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default(),
    );
    map.insert("freshness_score".to_string(), chunk.freshness_score.to_string());
    map.insert("broadcast_count".to_string(), chunk.broadcast_count.to_string());

    for (idx, subject) in chunk.primary_subjects.iter().take(5).enumerate() {
        map.insert(format!("primary_subject_{idx}"), subject.clone());
    }
    for (idx, theme) in chunk.themes.iter().take(3).enumerate() {
        map.insert(format!("theme_{idx}"), theme.clone());
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_core::{ComplexityTier, ConfidenceTier, ControversyLevel, EmotionalTone};

    #[test]
    fn flattens_list_fields_to_indexed_keys() {
        let chunk = Chunk::new(
            "c1",
            "body",
            2100,
            "appalachia",
            "event",
            ConfidenceTier::High,
            EmotionalTone::Hopeful,
            ComplexityTier::Simple,
            vec!["faction_a".into(), "faction_b".into()],
            vec!["hope".into()],
            ControversyLevel::Neutral,
        );
        let flat = flatten_metadata(&chunk);
        assert_eq!(flat.get("primary_subject_0"), Some(&"faction_a".to_string()));
        assert_eq!(flat.get("primary_subject_1"), Some(&"faction_b".to_string()));
        assert_eq!(flat.get("theme_0"), Some(&"hope".to_string()));
        assert!(!flat.contains_key("primary_subject_2"));
    }
}
