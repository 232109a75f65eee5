//! Reference / test backend: an in-process corpus with lexical-overlap
//! similarity scoring, grounded on the teacher's `tokenize` +
//! `lexical_relevance_score` approach in `memory/src/retrieval.rs`. A real
//! deployment swaps this for [`crate::http_store::HttpVectorStore`] without
//! the engine noticing — both speak [`KnowledgeStore`].

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use broadcast_core::{BroadcastError, Chunk, ChunkId, ScoredChunk, WhereClause};

use crate::eval::matches;
use crate::store::{ChunkMetadataPatch, KnowledgeStore};

pub struct InMemoryKnowledgeStore {
    chunks: RwLock<HashMap<ChunkId, Chunk>>,
}

impl InMemoryKnowledgeStore {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        let map = chunks.into_iter().map(|c| (c.chunk_id.clone(), c)).collect();
        Self {
            chunks: RwLock::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&self, chunk: Chunk) {
        self.chunks.write().unwrap().insert(chunk.chunk_id.clone(), chunk);
    }

    pub fn all(&self) -> Vec<Chunk> {
        self.chunks.read().unwrap().values().cloned().collect()
    }
}

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "was", "has", "are", "not", "this", "that", "with", "from", "have",
    "you", "can", "its", "will", "but", "they", "all", "been", "also", "into", "more", "than",
];

fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(|t| t.to_lowercase())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

fn lexical_similarity(body: &str, query_terms: &BTreeSet<String>) -> f32 {
    if query_terms.is_empty() {
        return 0.5;
    }
    let body_terms = tokenize(body);
    let overlap = query_terms.intersection(&body_terms).count() as f32;
    overlap / query_terms.len() as f32
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn search(
        &self,
        query_text: &str,
        where_clause: &WhereClause,
        n_results: usize,
    ) -> Result<Vec<ScoredChunk>, BroadcastError> {
        let query_terms = tokenize(query_text);
        let guard = self.chunks.read().map_err(|_| BroadcastError::Retrieval("lock poisoned".into()))?;

        let mut scored: Vec<ScoredChunk> = guard
            .values()
            .filter(|chunk| matches(chunk, where_clause))
            .map(|chunk| ScoredChunk {
                similarity: lexical_similarity(&chunk.body, &query_terms),
                chunk: chunk.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(n_results);
        Ok(scored)
    }

    async fn batch_update(&self, patches: &[ChunkMetadataPatch]) -> Result<(), BroadcastError> {
        let mut guard = self.chunks.write().map_err(|_| BroadcastError::Retrieval("lock poisoned".into()))?;
        for patch in patches {
            if let Some(chunk) = guard.get_mut(&patch.chunk_id) {
                chunk.last_broadcast_time = patch.last_broadcast_time;
                chunk.broadcast_count = patch.broadcast_count;
                chunk.freshness_score = patch.freshness_score;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_core::{ComplexityTier, ConfidenceTier, ControversyLevel, EmotionalTone};

    fn chunk(id: &str, year: i32, body: &str) -> Chunk {
        Chunk::new(
            id,
            body,
            year,
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

    #[tokio::test]
    async fn search_filters_by_where_clause_and_ranks_by_overlap() -> anyhow::Result<()> {
        let store = InMemoryKnowledgeStore::new(vec![
            chunk("future", 2300, "a story about raiders"),
            chunk("past_relevant", 2090, "raiders attacked the settlement"),
            chunk("past_irrelevant", 2090, "the weather was calm today"),
        ]);

        let results = store
            .search(
                "raiders attacked",
                &WhereClause::Lte { field: "year".into(), value: 2102.0 },
                5,
            )
            .await?;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.chunk_id.as_str(), "past_relevant");
        Ok(())
    }

    #[tokio::test]
    async fn batch_update_marks_chunk_used() -> anyhow::Result<()> {
        let store = InMemoryKnowledgeStore::new(vec![chunk("c1", 2090, "body")]);
        let now = chrono::Utc::now();
        store
            .batch_update(&[ChunkMetadataPatch {
                chunk_id: "c1".into(),
                last_broadcast_time: Some(now),
                broadcast_count: 1,
                freshness_score: 0.0,
            }])
            .await?;

        let all = store.all();
        assert_eq!(all[0].broadcast_count, 1);
        assert_eq!(all[0].freshness_score, 0.0);
        Ok(())
    }
}
