//! Engine configuration (spec §6 "Configuration (consumed)").
//!
//! One [`EngineConfig`] is constructed at `Orchestrator::start` and passed
//! down explicitly to every component — no process-wide mutable state (§9
//! Design Notes). Loading follows the teacher's `AppConfig::load_from`
//! shape: TOML file with `serde(default)` on every section so a partial or
//! missing file still produces a usable config.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use broadcast_core::story::Timeline;
use broadcast_core::ValidationMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnCriticalPolicy {
    Halt,
    ContinueWithFlag,
    Quarantine,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DjConfig {
    pub dj_name: String,
    pub personality_path: String,
}

impl Default for DjConfig {
    fn default() -> Self {
        Self {
            dj_name: "Julie".to_string(),
            personality_path: "personalities/julie.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub generation_model: String,
    pub validation_model: String,
    pub base_url: String,
    /// Generation LLM timeout in seconds (spec §5 default 90s).
    pub timeout_generation_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Transport-retry budget for `GenerationError` (spec §7 `R_transport=3`).
    pub transport_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            generation_model: "llama3.1:8b".to_string(),
            validation_model: "llama3.1:8b".to_string(),
            base_url: "http://localhost:11434".to_string(),
            timeout_generation_secs: 90,
            temperature: 0.9,
            max_tokens: 400,
            transport_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub mode: ValidationMode,
    /// Retry budget on invalid (spec §4.11 default `R = 3`).
    pub retries: u32,
    pub max_chars: usize,
    /// Wall-clock budget for the LLM validator pass in seconds (default 30s).
    pub llm_budget_secs: u64,
    /// Number of critical rule issues that short-circuits hybrid mode
    /// straight to invalid, skipping the LLM pass (spec §4.11: "≥2").
    pub critical_short_circuit_threshold: usize,
    pub on_critical: OnCriticalPolicy,
    /// How many characters of preceding text count as "preceded within a
    /// configurable context window" for the temporal rule's historical-marker
    /// exception (spec §4.11.1).
    pub temporal_context_window_chars: usize,
    /// Historical-marker phrases that exempt a following year token from the
    /// temporal check (e.g. "pre-war").
    pub historical_markers: Vec<String>,
    /// Years that are always permitted when quoted, regardless of `year_dj`
    /// (spec §4.11.1: "quoted past years ... on a whitelist").
    pub year_whitelist: Vec<i32>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            mode: ValidationMode::Hybrid,
            retries: 3,
            max_chars: 1200,
            llm_budget_secs: 30,
            critical_short_circuit_threshold: 2,
            on_critical: OnCriticalPolicy::ContinueWithFlag,
            temporal_context_window_chars: 60,
            historical_markers: vec![
                "pre-war".to_string(),
                "pre war".to_string(),
                "before the war".to_string(),
                "old world".to_string(),
            ],
            year_whitelist: vec![2077],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub segments_per_hour: u32,
    pub weather_slots: Vec<u8>,
    pub news_slots: Vec<u8>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            segments_per_hour: 3,
            weather_slots: vec![6, 12, 17],
            news_slots: vec![7, 13, 19],
        }
    }
}

/// Per-timeline story quotas and the classification weight bands used by
/// the extractor (spec §4.7 Open Question: thresholds are placeholders in
/// source and must be tunable; this config makes them explicit instead of
/// hard-coded constants).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryConfig {
    pub timeline_quotas: HashMap<String, u32>,
    /// Inclusive lower bound of narrative_weight for WEEKLY/MONTHLY/YEARLY;
    /// DAILY is everything below `weekly_min`.
    pub weekly_min: f32,
    pub monthly_min: f32,
    pub yearly_min: f32,
    /// Subjects the extractor searches against when seeding empty pools at
    /// startup (spec §4.7: seeding has no caller-supplied query, so the run
    /// needs a standing subject list).
    pub seed_subjects: Vec<String>,
}

impl Default for StoryConfig {
    fn default() -> Self {
        let mut timeline_quotas = HashMap::new();
        timeline_quotas.insert("daily".to_string(), 3);
        timeline_quotas.insert("weekly".to_string(), 6);
        timeline_quotas.insert("monthly".to_string(), 8);
        timeline_quotas.insert("yearly".to_string(), 10);
        Self {
            timeline_quotas,
            weekly_min: 3.0,
            monthly_min: 6.0,
            yearly_min: 8.0,
            seed_subjects: vec![
                "raiders".to_string(),
                "settlers".to_string(),
                "traders".to_string(),
                "brotherhood of steel".to_string(),
                "super mutants".to_string(),
                "ghouls".to_string(),
            ],
        }
    }
}

impl StoryConfig {
    pub fn quota_for(&self, timeline: Timeline) -> u32 {
        let key = match timeline {
            Timeline::Daily => "daily",
            Timeline::Weekly => "weekly",
            Timeline::Monthly => "monthly",
            Timeline::Yearly => "yearly",
        };
        self.timeline_quotas.get(key).copied().unwrap_or(3)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub freshness_threshold: f32,
    pub confidence_floor: Option<String>,
    /// Sliding window of recently-used subjects to avoid repeating (spec
    /// §4.9 default 5).
    pub recent_subjects_window: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            freshness_threshold: 0.3,
            confidence_floor: None,
            recent_subjects_window: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub ttl_retrieval_secs: u64,
    pub ttl_generation_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 2048,
            ttl_retrieval_secs: 3600,
            ttl_generation_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub session_memory_size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            session_memory_size: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub state_dir: String,
    /// Only the last N lightweight checkpoints are retained (spec §4.13 step 8).
    pub checkpoint_retain: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            state_dir: ".wasteland-radio".to_string(),
            checkpoint_retain: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeBackend {
    /// `broadcast_knowledge::HttpVectorStore` talking to an external corpus
    /// service (spec §6 "Vector corpus backend (consumed)").
    Http,
    /// `broadcast_knowledge::InMemoryKnowledgeStore` seeded from a JSON
    /// array of `Chunk` on disk — no external service required.
    LocalFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    pub backend: KnowledgeBackend,
    pub http_base_url: String,
    pub local_corpus_path: String,
    pub timeout_secs: u64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            backend: KnowledgeBackend::LocalFile,
            http_base_url: "http://localhost:8000".to_string(),
            local_corpus_path: "corpus.json".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub dj: DjConfig,
    pub llm: LlmConfig,
    pub validation: ValidationConfig,
    pub scheduler: SchedulerConfig,
    pub story: StoryConfig,
    pub knowledge: KnowledgeConfig,
    pub context: ContextConfig,
    pub cache: CacheConfig,
    pub memory: MemoryConfig,
    pub persistence: PersistenceConfig,
    pub telemetry: TelemetryConfig,
}

impl EngineConfig {
    /// Load from `path`, falling back to defaults for any section absent
    /// from the file (and for a missing file entirely), mirroring
    /// `AppConfig::load_from`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        if let Ok(base_url) = env::var("WASTELAND_RADIO_LLM_BASE_URL") {
            if !base_url.is_empty() {
                config.llm.base_url = base_url;
            }
        }
        if let Ok(base_url) = env::var("WASTELAND_RADIO_CORPUS_BASE_URL") {
            if !base_url.is_empty() {
                config.knowledge.http_base_url = base_url;
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() -> Result<()> {
        let config = EngineConfig::default();
        let rendered = toml::to_string_pretty(&config)?;
        let parsed: EngineConfig = toml::from_str(&rendered)?;
        assert_eq!(parsed.dj.dj_name, config.dj.dj_name);
        assert_eq!(parsed.story.quota_for(Timeline::Monthly), 8);
        Ok(())
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let config = EngineConfig::load_from("/nonexistent/path/broadcast.toml")?;
        assert_eq!(config.scheduler.segments_per_hour, 3);
        Ok(())
    }
}
