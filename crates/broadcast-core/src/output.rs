use serde::{Deserialize, Serialize};

use crate::ids::{ChunkId, StoryId};
use crate::segment::SegmentType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    Rules,
    Llm,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Critical,
    Warning,
    Suggestion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub category: String,
    pub message: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub mode: ValidationMode,
    pub is_valid: bool,
    pub score: Option<f32>,
    pub issues: Vec<ValidationIssue>,
    /// Run-level flags such as `"quality-issue"` or `"unaccepted"` (spec
    /// §4.11 retry policy / §7 `CriticalRuleViolation`).
    pub flags: Vec<String>,
}

impl ValidationReport {
    pub fn has_critical(&self) -> bool {
        self.issues.iter().any(|i| i.severity == IssueSeverity::Critical)
    }

    pub fn critical_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Critical)
            .count()
    }
}

/// One line of the output stream (spec §6 "Output stream (produced)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub segment_index: u64,
    pub hour: u8,
    pub segment_type: SegmentType,
    pub script_text: String,
    pub chunk_ids_used: Vec<ChunkId>,
    pub validation: ValidationReport,
    pub story_ref: Option<StoryId>,
    pub timing_ms: u64,
}
