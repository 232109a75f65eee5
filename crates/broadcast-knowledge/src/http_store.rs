//! HTTP-backed vector corpus client (spec §6 "Vector corpus backend
//! (consumed)"). Structurally mirrors the teacher's `OllamaClient`: a thin
//! `reqwest::Client` wrapper with an explicit per-call timeout and no
//! retry loop of its own — transport retry is the caller's concern (here,
//! the engine treats a failure as a soft `RetrievalError`).

use std::time::Duration;

use async_trait::async_trait;
use broadcast_core::{BroadcastError, Chunk, ScoredChunk, WhereClause};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::store::{ChunkMetadataPatch, KnowledgeStore};

pub struct HttpVectorStore {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpVectorStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    texts: Vec<&'a str>,
    n_results: usize,
    #[serde(rename = "where")]
    where_clause: Value,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<String>,
    #[serde(default)]
    documents: Vec<String>,
    #[serde(default)]
    metadatas: Vec<Value>,
    #[serde(default)]
    scores: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct BatchUpdateRequest {
    ids: Vec<String>,
    metadata_patch: Vec<Value>,
}

/// Translate a [`WhereClause`] into the `$gte`/`$lte`/`$in`/`$and`/`$or`
/// JSON shape the backend contract (spec §4.1) expects.
fn to_query_json(clause: &WhereClause) -> Value {
    match clause {
        WhereClause::Any => json!({}),
        WhereClause::Eq { field, value } => json!({ field: value }),
        WhereClause::Gte { field, value } => json!({ field: { "$gte": value } }),
        WhereClause::Lte { field, value } => json!({ field: { "$lte": value } }),
        WhereClause::In { field, values } => json!({ field: { "$in": values } }),
        WhereClause::NotIn { field, values } => json!({ field: { "$nin": values } }),
        WhereClause::And(clauses) => json!({ "$and": clauses.iter().map(to_query_json).collect::<Vec<_>>() }),
        WhereClause::Or(clauses) => json!({ "$or": clauses.iter().map(to_query_json).collect::<Vec<_>>() }),
    }
}

fn chunk_from_response(id: &str, document: &str, metadata: &Value, score: f32) -> Option<Chunk> {
    let year = metadata.get("year")?.as_i64()? as i32;
    let region = metadata.get("region")?.as_str()?.to_string();
    let content_type = metadata.get("content_type")?.as_str()?.to_string();

    let confidence_tier = serde_json::from_value(metadata.get("confidence_tier")?.clone()).ok()?;
    let emotional_tone = serde_json::from_value(metadata.get("emotional_tone")?.clone()).ok()?;
    let complexity_tier = serde_json::from_value(metadata.get("complexity_tier")?.clone()).ok()?;
    let controversy_level = serde_json::from_value(
        metadata
            .get("controversy_level")
            .cloned()
            .unwrap_or_else(|| json!("neutral")),
    )
    .ok()?;

    let mut primary_subjects = Vec::new();
    for idx in 0..5 {
        match metadata.get(format!("primary_subject_{idx}")).and_then(|v| v.as_str()) {
            Some(s) => primary_subjects.push(s.to_string()),
            None => break,
        }
    }
    let mut themes = Vec::new();
    for idx in 0..3 {
        match metadata.get(format!("theme_{idx}")).and_then(|v| v.as_str()) {
            Some(s) => themes.push(s.to_string()),
            None => break,
        }
    }

    let mut chunk = Chunk::new(
        id,
        document,
        year,
        region,
        content_type,
        confidence_tier,
        emotional_tone,
        complexity_tier,
        primary_subjects,
        themes,
        controversy_level,
    );
    chunk.broadcast_count = metadata
        .get("broadcast_count")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;
    chunk.freshness_score = metadata
        .get("freshness_score")
        .and_then(|v| v.as_f64())
        .unwrap_or(1.0) as f32;
    let _ = score;
    Some(chunk)
}

#[async_trait]
impl KnowledgeStore for HttpVectorStore {
    async fn search(
        &self,
        query_text: &str,
        where_clause: &WhereClause,
        n_results: usize,
    ) -> Result<Vec<ScoredChunk>, BroadcastError> {
        let body = QueryRequest {
            texts: vec![query_text],
            n_results,
            where_clause: to_query_json(where_clause),
        };

        let response = self
            .client
            .post(format!("{}/query", self.base_url))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| BroadcastError::Retrieval(e.to_string()))?
            .error_for_status()
            .map_err(|e| BroadcastError::Retrieval(e.to_string()))?
            .json::<QueryResponse>()
            .await
            .map_err(|e| BroadcastError::Retrieval(e.to_string()))?;

        let mut results = Vec::with_capacity(response.ids.len());
        for (((id, doc), metadata), score) in response
            .ids
            .iter()
            .zip(response.documents.iter())
            .zip(response.metadatas.iter())
            .zip(response.scores.iter().chain(std::iter::repeat(&0.0)))
        {
            if let Some(chunk) = chunk_from_response(id, doc, metadata, *score) {
                results.push(ScoredChunk { chunk, similarity: *score });
            }
        }
        Ok(results)
    }

    async fn batch_update(&self, patches: &[ChunkMetadataPatch]) -> Result<(), BroadcastError> {
        if patches.is_empty() {
            return Ok(());
        }
        let ids = patches.iter().map(|p| p.chunk_id.to_string()).collect();
        let metadata_patch = patches
            .iter()
            .map(|p| {
                json!({
                    "last_broadcast_time": p.last_broadcast_time,
                    "broadcast_count": p.broadcast_count,
                    "freshness_score": p.freshness_score,
                })
            })
            .collect();

        self.client
            .post(format!("{}/batch_update", self.base_url))
            .timeout(self.timeout)
            .json(&BatchUpdateRequest { ids, metadata_patch })
            .send()
            .await
            .map_err(|e| BroadcastError::Retrieval(e.to_string()))?
            .error_for_status()
            .map_err(|e| BroadcastError::Retrieval(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_nested_and_or_clauses() {
        let clause = WhereClause::and(vec![
            WhereClause::Lte { field: "year".into(), value: 2102.0 },
            WhereClause::or(vec![
                WhereClause::Eq { field: "region".into(), value: "appalachia".into() },
                WhereClause::Eq { field: "region".into(), value: "capital".into() },
            ]),
        ]);
        let json = to_query_json(&clause);
        assert!(json["$and"].is_array());
    }

}
