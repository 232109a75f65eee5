use serde::{Deserialize, Serialize};

use crate::chunk::EmotionalTone;
use crate::filter::WhereClause;

/// Character constraints + per-DJ retrieval filters (spec §3 `Personality`).
///
/// Read-only within a run (§3 ownership rules); loaded once at
/// `Orchestrator::start` the way the teacher loads `AppConfig` once and
/// threads it down explicitly (§9 Design Notes: no global singleton).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personality {
    pub name: String,
    /// The DJ's embedded "current year" — the temporal ceiling for rule
    /// validation (spec §4.11.1, §8 property 1).
    pub year_dj: i32,
    pub region: String,
    pub forbidden_factions: Vec<String>,
    pub forbidden_content_types: Vec<String>,
    pub region_allow: Vec<String>,
    pub catchphrases: Vec<String>,
    pub filler_words: Vec<String>,
    pub taboo_words: Vec<String>,
    pub default_mood: Vec<EmotionalTone>,
}

impl Personality {
    /// Temporal/spatial retrieval filter (spec §4.3): year_max = Y_dj,
    /// region_allow, forbidden factions/content-types excluded.
    pub fn base_filter(&self) -> WhereClause {
        let mut clauses = vec![WhereClause::Lte {
            field: "year".to_string(),
            value: self.year_dj as f64,
        }];

        if !self.region_allow.is_empty() {
            clauses.push(WhereClause::In {
                field: "region".to_string(),
                values: self.region_allow.clone(),
            });
        }
        if !self.forbidden_content_types.is_empty() {
            clauses.push(WhereClause::NotIn {
                field: "content_type".to_string(),
                values: self.forbidden_content_types.clone(),
            });
        }
        if !self.forbidden_factions.is_empty() {
            clauses.push(WhereClause::NotIn {
                field: "primary_subjects".to_string(),
                values: self.forbidden_factions.clone(),
            });
        }

        WhereClause::and(clauses)
    }
}
