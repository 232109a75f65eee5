use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ChunkId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalTone {
    Hopeful,
    Tragic,
    Mysterious,
    Comedic,
    Tense,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    Simple,
    Moderate,
    Complex,
}

impl ComplexityTier {
    /// Rotation order from §4.9: simple → moderate → complex → simple.
    pub fn next(self) -> Self {
        match self {
            ComplexityTier::Simple => ComplexityTier::Moderate,
            ComplexityTier::Moderate => ComplexityTier::Complex,
            ComplexityTier::Complex => ComplexityTier::Simple,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControversyLevel {
    Neutral,
    Sensitive,
    Controversial,
}

/// Unit of retrieved lore (spec §3, `Chunk`).
///
/// `primary_subjects` and `themes` are capped at 5 and 3 respectively per
/// the spec; callers that build a `Chunk` from an ingestion record should
/// truncate rather than panic on overflow (see `Chunk::new`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: ChunkId,
    pub body: String,
    pub year: i32,
    pub region: String,
    pub content_type: String,
    pub confidence_tier: ConfidenceTier,
    pub emotional_tone: EmotionalTone,
    pub complexity_tier: ComplexityTier,
    pub primary_subjects: Vec<String>,
    pub themes: Vec<String>,
    pub controversy_level: ControversyLevel,
    pub last_broadcast_time: Option<DateTime<Utc>>,
    pub broadcast_count: u32,
    pub freshness_score: f32,
}

pub const MAX_PRIMARY_SUBJECTS: usize = 5;
pub const MAX_THEMES: usize = 3;

impl Chunk {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chunk_id: impl Into<ChunkId>,
        body: impl Into<String>,
        year: i32,
        region: impl Into<String>,
        content_type: impl Into<String>,
        confidence_tier: ConfidenceTier,
        emotional_tone: EmotionalTone,
        complexity_tier: ComplexityTier,
        mut primary_subjects: Vec<String>,
        mut themes: Vec<String>,
        controversy_level: ControversyLevel,
    ) -> Self {
        primary_subjects.truncate(MAX_PRIMARY_SUBJECTS);
        themes.truncate(MAX_THEMES);
        Self {
            chunk_id: chunk_id.into(),
            body: body.into(),
            year,
            region: region.into(),
            content_type: content_type.into(),
            confidence_tier,
            emotional_tone,
            complexity_tier,
            primary_subjects,
            themes,
            controversy_level,
            last_broadcast_time: None,
            broadcast_count: 0,
            // A never-used chunk is fully fresh (spec §3 invariant).
            freshness_score: 1.0,
        }
    }

    pub fn is_never_used(&self) -> bool {
        self.last_broadcast_time.is_none()
    }
}

/// A retrieved chunk plus the similarity score the knowledge store assigned
/// it (spec §4.1: `search` returns a ranked list of `Chunk` with scores).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub similarity: f32,
}
