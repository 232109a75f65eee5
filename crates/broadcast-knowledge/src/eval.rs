//! In-process evaluator for [`WhereClause`] against a [`Chunk`].
//!
//! Each predicate kind is its own match arm with no shared mutable state,
//! so one malformed clause (e.g. a numeric comparison against a field that
//! is not numeric) cannot cascade into evaluating siblings incorrectly —
//! the isolated-rule style the validator also uses (§9 Design Notes).

use broadcast_core::{Chunk, WhereClause};

use crate::flatten::flatten_metadata;

pub fn matches(chunk: &Chunk, clause: &WhereClause) -> bool {
    match clause {
        WhereClause::Any => true,
        WhereClause::Eq { field, value } => field_scalar(chunk, field).as_deref() == Some(value.as_str()),
        WhereClause::Gte { field, value } => field_numeric(chunk, field).map(|v| v >= *value).unwrap_or(false),
        WhereClause::Lte { field, value } => field_numeric(chunk, field).map(|v| v <= *value).unwrap_or(false),
        WhereClause::In { field, values } => field_values(chunk, field).iter().any(|v| values.contains(v)),
        WhereClause::NotIn { field, values } => !field_values(chunk, field).iter().any(|v| values.contains(v)),
        WhereClause::And(clauses) => clauses.iter().all(|c| matches(chunk, c)),
        WhereClause::Or(clauses) => clauses.iter().any(|c| matches(chunk, c)),
    }
}

fn field_scalar(chunk: &Chunk, field: &str) -> Option<String> {
    flatten_metadata(chunk).get(field).cloned()
}

fn field_numeric(chunk: &Chunk, field: &str) -> Option<f64> {
    match field {
        "year" => Some(chunk.year as f64),
        "freshness_score" => Some(chunk.freshness_score as f64),
        "broadcast_count" => Some(chunk.broadcast_count as f64),
        _ => flatten_metadata(chunk).get(field).and_then(|v| v.parse().ok()),
    }
}

/// Values to test for set membership. List-valued fields return all their
/// elements; scalar fields return a single-element vec.
fn field_values(chunk: &Chunk, field: &str) -> Vec<String> {
    match field {
        "primary_subjects" => chunk.primary_subjects.clone(),
        "themes" => chunk.themes.clone(),
        _ => field_scalar(chunk, field).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_core::{ComplexityTier, ConfidenceTier, ControversyLevel, EmotionalTone};

    fn sample() -> Chunk {
        Chunk::new(
            "c1",
            "body",
            2095,
            "appalachia",
            "event",
            ConfidenceTier::High,
            EmotionalTone::Hopeful,
            ComplexityTier::Simple,
            vec!["raiders".into()],
            vec!["hope".into()],
            ControversyLevel::Neutral,
        )
    }

    #[test]
    fn year_lte_filters_future_chunks() {
        let chunk = sample();
        assert!(matches(&chunk, &WhereClause::Lte { field: "year".into(), value: 2102.0 }));
        assert!(!matches(&chunk, &WhereClause::Lte { field: "year".into(), value: 2000.0 }));
    }

    #[test]
    fn not_in_excludes_forbidden_subject() {
        let chunk = sample();
        let clause = WhereClause::NotIn {
            field: "primary_subjects".into(),
            values: vec!["raiders".into()],
        };
        assert!(!matches(&chunk, &clause));
    }

    #[test]
    fn and_requires_every_clause() {
        let chunk = sample();
        let clause = WhereClause::and(vec![
            WhereClause::Eq { field: "region".into(), value: "appalachia".into() },
            WhereClause::Gte { field: "freshness_score".into(), value: 2.0 },
        ]);
        assert!(!matches(&chunk, &clause));
    }
}
