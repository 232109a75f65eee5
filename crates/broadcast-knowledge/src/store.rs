use async_trait::async_trait;
use broadcast_core::{BroadcastError, ChunkId, ScoredChunk, WhereClause};
use chrono::{DateTime, Utc};

/// A freshness/broadcast-count patch applied to one chunk (spec §6
/// `batch_update(ids, metadata_patch)`).
#[derive(Debug, Clone)]
pub struct ChunkMetadataPatch {
    pub chunk_id: ChunkId,
    pub last_broadcast_time: Option<DateTime<Utc>>,
    pub broadcast_count: u32,
    pub freshness_score: f32,
}

/// Vector corpus wrapper (spec §4.1, C1). Stateless with respect to the
/// engine — implementers own their own connection/session handling.
///
/// A `RetrievalError` (mapped here to [`BroadcastError::Retrieval`]) is a
/// *soft* failure: callers treat it as an empty result set, log, and
/// continue (spec §7).
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn search(
        &self,
        query_text: &str,
        where_clause: &WhereClause,
        n_results: usize,
    ) -> Result<Vec<ScoredChunk>, BroadcastError>;

    /// Apply freshness/broadcast-count mutations. The only mutation path
    /// that reaches the backing store (spec §5 shared-resource policy).
    async fn batch_update(&self, patches: &[ChunkMetadataPatch]) -> Result<(), BroadcastError>;
}
