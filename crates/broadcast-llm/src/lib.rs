pub mod client;
pub mod prompt;

pub use client::{normalize_model_id, GenerationClient, GenerationRequest, GenerationResponse, OllamaGenerationClient};
pub use prompt::render_prompt;
