use thiserror::Error;

/// Error taxonomy for the broadcast engine (spec §7).
///
/// Every variant here corresponds to one of the documented failure policies;
/// the orchestrator matches on this type rather than inspecting error
/// strings. Component crates are free to use `anyhow::Result` internally
/// (the way the teacher's `memory`/`llm` crates do) and convert to
/// `BroadcastError` only at the boundary the orchestrator observes.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// Vector corpus backend unavailable or timed out. Treated as soft:
    /// callers should log, fall back to an empty result set, and continue.
    #[error("retrieval backend error: {0}")]
    Retrieval(String),

    /// Generation LLM transport/timeout failure after transport retries.
    #[error("generation failed after {attempts} attempts: {message}")]
    Generation { attempts: u32, message: String },

    /// The LLM validator's response could not be parsed by any parser stage.
    #[error("validator response could not be parsed: {0}")]
    ValidationParse(String),

    /// A hard rule violation survived every retry.
    #[error("critical rule violation survived retries: {0}")]
    CriticalRuleViolation(String),

    /// Persistence (checkpoint) write failed even after one retry.
    #[error("persistence error writing {artifact}: {message}")]
    Persistence { artifact: String, message: String },

    /// The story extractor produced zero stories after repeated filter
    /// relaxation; story segments degrade to gossip until pools refill.
    #[error("story pool seeding failed: {0}")]
    PoolSeeding(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BroadcastError>;
