use serde::{Deserialize, Serialize};

/// A single metadata predicate evaluated against a [`crate::chunk::Chunk`].
///
/// Field names are `Chunk` field names (`"year"`, `"region"`,
/// `"content_type"`, `"freshness_score"`, `"confidence_tier"`,
/// `"emotional_tone"`, `"complexity_tier"`, `"controversy_level"`,
/// `"primary_subjects"`, `"themes"`). `In`/`NotIn` treat list-valued fields
/// (`primary_subjects`, `themes`) as "any element matches"; scalar fields as
/// simple membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WhereClause {
    /// Equality on a scalar field.
    Eq { field: String, value: String },
    /// Numeric `$gte` on a numeric field (`year`, `freshness_score`).
    Gte { field: String, value: f64 },
    /// Numeric `$lte` on a numeric field.
    Lte { field: String, value: f64 },
    /// Set inclusion (`$in`).
    In { field: String, values: Vec<String> },
    /// Set exclusion — the complement of `In`, used for forbidden lists.
    NotIn { field: String, values: Vec<String> },
    And(Vec<WhereClause>),
    Or(Vec<WhereClause>),
    /// Always-true predicate; the empty conjunction.
    Any,
}

impl WhereClause {
    pub fn and(clauses: impl IntoIterator<Item = WhereClause>) -> WhereClause {
        let clauses: Vec<_> = clauses.into_iter().filter(|c| !matches!(c, WhereClause::Any)).collect();
        if clauses.is_empty() {
            WhereClause::Any
        } else if clauses.len() == 1 {
            clauses.into_iter().next().unwrap()
        } else {
            WhereClause::And(clauses)
        }
    }

    pub fn or(clauses: impl IntoIterator<Item = WhereClause>) -> WhereClause {
        let clauses: Vec<_> = clauses.into_iter().collect();
        if clauses.len() == 1 {
            clauses.into_iter().next().unwrap()
        } else {
            WhereClause::Or(clauses)
        }
    }
}
