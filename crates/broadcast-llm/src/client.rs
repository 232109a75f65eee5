//! Generation LLM transport (spec §4.10, C10), grounded on the teacher's
//! `OllamaClient::chat_model` — same `/api/generate` request shape, minus
//! the stdout-formatted error strings: here transport failures become a
//! typed [`BroadcastError::Generation`] the Orchestrator can act on.

use std::time::Duration;

use async_trait::async_trait;
use broadcast_core::BroadcastError;
use serde_json::json;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// One model ID per call (spec §4.10 "model-selection normalisation");
/// collapses internal whitespace runs to a single space and trims the
/// ends, so a misconfigured model string never reaches the transport with
/// stray padding.
pub fn normalize_model_id(model: &str) -> String {
    model.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, BroadcastError>;
}

pub struct OllamaGenerationClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    transport_retries: u32,
}

impl OllamaGenerationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, transport_retries: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
            transport_retries,
        }
    }

    async fn call_once(&self, request: &GenerationRequest) -> anyhow::Result<GenerationResponse> {
        let endpoint = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let payload = json!({
            "model": normalize_model_id(&request.model),
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            }
        });

        let response = self
            .client
            .post(endpoint)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        if !status.is_success() {
            anyhow::bail!("generation LLM returned {status}: {body}");
        }

        let text = body
            .get("response")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("generation LLM response missing 'response' field"))?
            .to_string();
        let prompt_tokens = body.get("prompt_eval_count").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        let completion_tokens = body.get("eval_count").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

        Ok(GenerationResponse { text, prompt_tokens, completion_tokens })
    }
}

#[async_trait]
impl GenerationClient for OllamaGenerationClient {
    /// Retries on transport error up to `transport_retries` times with
    /// linear backoff (spec §7 `R_transport=3`); exhausting retries
    /// surfaces `BroadcastError::Generation` so the Orchestrator can mark
    /// the segment `generation-failed` and move on (§7).
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, BroadcastError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.call_once(request).await {
                Ok(response) => return Ok(response),
                Err(err) if attempt <= self.transport_retries => {
                    warn!(attempt, error = %err, "generation transport error, retrying");
                    tokio::time::sleep(Duration::from_millis(200 * attempt as u64)).await;
                }
                Err(err) => {
                    return Err(BroadcastError::Generation { attempts: attempt, message: err.to_string() });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_model_id_collapses_whitespace() {
        assert_eq!(normalize_model_id("llama3.1:8b"), "llama3.1:8b");
        assert_eq!(normalize_model_id("  llama3.1 : 8b "), "llama3.1 : 8b");
        assert_eq!(normalize_model_id("llama3.1   instruct"), "llama3.1 instruct");
    }
}
