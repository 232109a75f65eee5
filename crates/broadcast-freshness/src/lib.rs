//! Per-chunk usage/decay tracking preventing content repetition (spec §4.2,
//! C2). The tracker itself holds no chunk data — `Chunk` freshness fields
//! remain the source of truth inside the [`KnowledgeStore`] — it only
//! computes patches and batches them through `batch_update`, matching §5's
//! "the Freshness Tracker's batch writes ... are the only mutations that
//! reach the external store".

use broadcast_core::{BroadcastError, Chunk, WhereClause};
use broadcast_knowledge::{ChunkMetadataPatch, KnowledgeStore};
use chrono::{DateTime, Utc};

/// Freshness half-life window (spec §3 invariant: `Δhours_since_last_use / 168`).
pub const FRESHNESS_WINDOW_HOURS: f32 = 168.0;

/// `fresh_score(last_used, now)` (spec §4.2).
pub fn fresh_score(last_used: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f32 {
    let Some(last_used) = last_used else {
        return 1.0;
    };
    let hours = (now - last_used).num_milliseconds() as f32 / (1000.0 * 3600.0);
    (hours / FRESHNESS_WINDOW_HOURS).clamp(0.0, 1.0)
}

pub struct FreshnessTracker {
    last_decay_at: Option<DateTime<Utc>>,
}

impl Default for FreshnessTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl FreshnessTracker {
    pub fn new() -> Self {
        Self { last_decay_at: None }
    }

    /// Mark a batch of chunks used *after* validation accepts the segment
    /// that consumed them (spec §4.2 ordering). `chunks` must be the
    /// pre-use `Chunk` records so the new `broadcast_count` can be derived.
    pub async fn mark_used(
        &mut self,
        store: &dyn KnowledgeStore,
        chunks: &[Chunk],
        now: DateTime<Utc>,
    ) -> Result<(), BroadcastError> {
        if chunks.is_empty() {
            return Ok(());
        }
        let patches: Vec<ChunkMetadataPatch> = chunks
            .iter()
            .map(|chunk| ChunkMetadataPatch {
                chunk_id: chunk.chunk_id.clone(),
                last_broadcast_time: Some(now),
                broadcast_count: chunk.broadcast_count + 1,
                freshness_score: 0.0,
            })
            .collect();
        store.batch_update(&patches).await
    }

    /// Recompute freshness for the given corpus snapshot. Idempotent; the
    /// one-hour throttle below is advisory (repeated calls recompute the
    /// same scores and never corrupt state) — it just avoids needless
    /// backend churn when called more often than the spec's "at most once
    /// per hour" guidance.
    pub async fn decay_all(
        &mut self,
        store: &dyn KnowledgeStore,
        chunks: &[Chunk],
        now: DateTime<Utc>,
    ) -> Result<usize, BroadcastError> {
        if let Some(last) = self.last_decay_at {
            if now - last < chrono::Duration::hours(1) {
                return Ok(0);
            }
        }

        let patches: Vec<ChunkMetadataPatch> = chunks
            .iter()
            .map(|chunk| ChunkMetadataPatch {
                chunk_id: chunk.chunk_id.clone(),
                last_broadcast_time: chunk.last_broadcast_time,
                broadcast_count: chunk.broadcast_count,
                freshness_score: fresh_score(chunk.last_broadcast_time, now),
            })
            .collect();
        let count = patches.len();
        store.batch_update(&patches).await?;
        self.last_decay_at = Some(now);
        Ok(count)
    }

    /// Predicate for C1's `where` clause: `freshness_score >= min_freshness`.
    pub fn filter_fresh(min_freshness: f32) -> WhereClause {
        WhereClause::Gte {
            field: "freshness_score".to_string(),
            value: min_freshness as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_core::{ComplexityTier, ConfidenceTier, ControversyLevel, EmotionalTone};
    use broadcast_knowledge::InMemoryKnowledgeStore;

    fn chunk(id: &str) -> Chunk {
        Chunk::new(
            id,
            "body",
            2090,
            "appalachia",
            "event",
            ConfidenceTier::High,
            EmotionalTone::Neutral,
            ComplexityTier::Simple,
            vec![],
            vec![],
            ControversyLevel::Neutral,
        )
    }

    #[test]
    fn never_used_chunk_is_fully_fresh() {
        assert_eq!(fresh_score(None, Utc::now()), 1.0);
    }

    #[test]
    fn immediately_after_use_freshness_is_zero() {
        let now = Utc::now();
        assert_eq!(fresh_score(Some(now), now), 0.0);
    }

    #[test]
    fn freshness_saturates_at_one_week() {
        let now = Utc::now();
        let last = now - chrono::Duration::hours(168);
        assert_eq!(fresh_score(Some(last), now), 1.0);
        let last_over = now - chrono::Duration::hours(500);
        assert_eq!(fresh_score(Some(last_over), now), 1.0);
    }

    #[test]
    fn freshness_is_linear_within_the_window() {
        let now = Utc::now();
        let last = now - chrono::Duration::hours(84);
        let score = fresh_score(Some(last), now);
        assert!((score - 0.5).abs() < 0.01);
    }

    #[tokio::test]
    async fn mark_used_resets_freshness_and_increments_count() -> anyhow::Result<()> {
        let store = InMemoryKnowledgeStore::new(vec![chunk("c1")]);
        let mut tracker = FreshnessTracker::new();
        let now = Utc::now();

        tracker.mark_used(&store, &[chunk("c1")], now).await?;

        let all = store.all();
        let updated = all.iter().find(|c| c.chunk_id.as_str() == "c1").unwrap();
        assert_eq!(updated.freshness_score, 0.0);
        assert_eq!(updated.broadcast_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn decay_all_is_a_noop_within_the_same_hour() -> anyhow::Result<()> {
        let store = InMemoryKnowledgeStore::new(vec![chunk("c1")]);
        let mut tracker = FreshnessTracker::new();
        let now = Utc::now();

        let first = tracker.decay_all(&store, &[chunk("c1")], now).await?;
        let second = tracker
            .decay_all(&store, &[chunk("c1")], now + chrono::Duration::minutes(10))
            .await?;

        assert_eq!(first, 1);
        assert_eq!(second, 0);
        Ok(())
    }
}
