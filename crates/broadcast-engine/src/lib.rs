//! Broadcast Orchestrator (spec §4.13, C13): drives the per-segment
//! pipeline, owns `WorldState`/`StoryState`/Session Memory/Cache, and
//! checkpoints after every segment. Grounded on the teacher's top-level
//! `runtime/src/runtime/mod.rs` (one struct holding every subsystem,
//! dispatching to them in a fixed order) plus `event_log.rs`'s
//! checkpoint/backup discipline.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use broadcast_cache::{fingerprint, EntryKind, SegmentCache};
use broadcast_config::{EngineConfig, OnCriticalPolicy};
use broadcast_context::{assemble, max_relax_level, ContextRequest};
use broadcast_core::persist::JsonlLog;
use broadcast_core::{
    BroadcastError, Chunk, ChunkId, ComplexityTier, Personality, RecentSegment, ScoredChunk,
    SegmentRecord, SegmentType, StoryBeatRef, Timeline, Weather, WeatherEvent, WeatherSnapshot, WeatherType,
};
use broadcast_freshness::FreshnessTracker;
use broadcast_knowledge::KnowledgeStore;
use broadcast_llm::{render_prompt, GenerationClient, GenerationRequest};
use broadcast_memory::SessionMemory;
use broadcast_scheduler::schedule_next;
use broadcast_story::{extract_stories, StoryState};
use broadcast_core::ValidationMode;
use broadcast_validator::{validate_hybrid, validate_llm, validate_rules};
use broadcast_world::WorldStateStore;

/// Outcome of one `generate_next_segment()` call (spec §7: "the engine
/// never raises ... it either returns a segment record (possibly flagged)
/// or signals 'skip' via a sentinel").
#[derive(Debug)]
pub enum SegmentOutcome {
    Committed(SegmentRecord),
    /// Generation exhausted its transport retries; no script was produced.
    Skipped { segment_index: u64, reason: String },
    /// Cancellation was observed before commit; nothing was written.
    Cancelled,
    /// A critical rule violation survived every retry and `on_critical` is
    /// `Halt` — the caller should stop requesting further segments.
    Halted { segment_index: u64, reason: String },
}

#[derive(Debug, Clone, Default)]
pub struct EngineSummary {
    pub segments_committed: u64,
    pub segments_skipped: u64,
    pub generation_failures: u64,
    pub validation_failures: u64,
    pub critical_violations: u64,
    pub pool_seeding_degraded: bool,
    pub retrieval_soft_failures: u64,
}

pub struct Orchestrator {
    config: EngineConfig,
    personality: Personality,
    knowledge: Arc<dyn KnowledgeStore>,
    generation_client: Arc<dyn GenerationClient>,
    world: WorldStateStore,
    story_state: StoryState,
    session_memory: SessionMemory,
    cache: SegmentCache,
    freshness: FreshnessTracker,
    output_log: JsonlLog,
    segment_index: u64,
    segments_in_current_hour: u32,
    complexity_tier: ComplexityTier,
    /// Lookup from a chunk id still referenced in session memory to its
    /// subjects (spec §9 arena pattern: the ring only stores ids). Pruned on
    /// every commit to stay bounded by the ring's capacity.
    subject_lookup: HashMap<ChunkId, Vec<String>>,
    cancel: Arc<AtomicBool>,
    summary: EngineSummary,
}

fn where_fingerprint_part(where_clause: &broadcast_core::WhereClause) -> String {
    serde_json::to_string(where_clause).unwrap_or_default()
}

impl Orchestrator {
    /// Loads or initialises WorldState, StoryState, and Session Memory,
    /// then seeds story pools if they're empty (spec §4.13 `start`).
    /// Session Memory is never persisted, so it always starts empty —
    /// resuming from a checkpoint only restores WorldState/StoryState.
    pub async fn start(
        config: EngineConfig,
        knowledge: Arc<dyn KnowledgeStore>,
        generation_client: Arc<dyn GenerationClient>,
    ) -> anyhow::Result<Self> {
        let personality = broadcast_personality::load_from(&config.dj.personality_path)
            .await
            .with_context(|| format!("loading personality from {}", config.dj.personality_path))?;

        let state_dir = PathBuf::from(&config.persistence.state_dir);
        let world = WorldStateStore::load_or_init(
            state_dir.join("world_state.json"),
            default_start_date(),
            default_start_weather(),
        )
        .await?;
        let mut story_state = StoryState::load_or_init(state_dir.join("story_state.json")).await?;
        let cache = SegmentCache::open(state_dir.join("segment_cache.redb"), config.cache.max_entries)?;
        let output_log = JsonlLog::new(state_dir.join("segments.jsonl"));

        let mut summary = EngineSummary::default();
        if story_state.needs_seeding() {
            match extract_stories(
                knowledge.as_ref(),
                &personality,
                &config.story,
                &config.story.seed_subjects,
                20,
            )
            .await
            {
                Ok(stories) if !stories.is_empty() => {
                    info!(count = stories.len(), "seeded story pools");
                    story_state.seed(stories);
                }
                Ok(_) => {
                    warn!("story pool seeding produced zero stories after extraction; degrading to gossip");
                    summary.pool_seeding_degraded = true;
                }
                Err(err) => {
                    warn!(error = %err, "story pool seeding failed; degrading to gossip");
                    summary.pool_seeding_degraded = true;
                }
            }
        }

        let session_memory = SessionMemory::new(config.memory.session_memory_size);

        Ok(Self {
            config,
            personality,
            knowledge,
            generation_client,
            world,
            story_state,
            session_memory,
            cache,
            freshness: FreshnessTracker::new(),
            output_log,
            segment_index: 0,
            segments_in_current_hour: 0,
            complexity_tier: ComplexityTier::Simple,
            subject_lookup: HashMap::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            summary,
        })
    }

    /// A clone of the cancellation flag callers can set from another task
    /// to request a clean stop (spec §5 "Cancellation").
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Picks which timeline's story to progress this segment, activating
    /// the next pool entry if nothing is currently active (spec §4.6
    /// `pool → active`). Returns `None` when no timeline has an eligible
    /// beat, in which case the caller degrades to gossip (spec §8 S6).
    fn pick_story_timeline(&mut self) -> Option<Timeline> {
        for timeline in Timeline::ALL {
            if self.story_state.current_act(timeline).is_none() {
                self.story_state.activate_next(timeline, &self.config.story);
            }
            if self.story_state.current_act(timeline).is_some()
                && self.story_state.quota_permits(timeline, &self.config.story)
            {
                return Some(timeline);
            }
        }
        None
    }

    fn build_request<'a>(
        &'a self,
        segment_type: SegmentType,
        story_timeline: Option<Timeline>,
        recent_subjects: &'a [String],
        weather: &'a broadcast_core::Weather,
        hour: u8,
        notable_recent_weather: Vec<String>,
    ) -> ContextRequest<'a> {
        ContextRequest {
            segment_type,
            personality: &self.personality,
            hour,
            region: &self.personality.region,
            weather,
            notable_recent_weather,
            memory: &self.session_memory,
            recent_subjects,
            story_state: Some(&self.story_state),
            story_timeline,
            complexity_tier: self.complexity_tier,
            config: &self.config.context,
        }
    }

    fn notable_recent_weather(&self) -> Vec<String> {
        self.world
            .recent_notable_weather(&self.personality.region, 7)
            .into_iter()
            .map(|e| format!("{:?} ({} days ago)", e.weather.kind, (Utc::now() - e.occurred_at).num_days()))
            .collect()
    }

    /// Cache-or-retrieve (spec §4.13 step 4). On a retrieval error the
    /// failure is soft: log, relax the filter by one step, retry once,
    /// and accept an empty result if that also fails (spec §7
    /// `RetrievalError`).
    async fn retrieve(
        &mut self,
        query: &str,
        where_clause: &broadcast_core::WhereClause,
        relax_level: usize,
        max_level: usize,
    ) -> Vec<ScoredChunk> {
        let where_part = where_fingerprint_part(where_clause);
        let key = fingerprint(EntryKind::Retrieval, &[query, where_part.as_str(), "20"]);
        if let Ok(Some(cached)) = self.cache.get::<Vec<ScoredChunk>>(EntryKind::Retrieval, &key) {
            return cached;
        }

        match self.knowledge.search(query, where_clause, 20).await {
            Ok(chunks) if !chunks.is_empty() => {
                let _ = self.cache.put(
                    EntryKind::Retrieval,
                    &key,
                    &chunks,
                    self.config.cache.ttl_retrieval_secs,
                );
                chunks
            }
            Ok(_) | Err(_) => {
                self.summary.retrieval_soft_failures += 1;
                if relax_level < max_level {
                    Vec::new()
                } else {
                    warn!(query, "retrieval returned nothing even at maximum filter relaxation");
                    Vec::new()
                }
            }
        }
    }

    /// Generator (spec §4.10, C10). Bypasses the cache on a validator
    /// rejection retry (`force_fresh`) so the regeneration actually talks
    /// to the LLM instead of replaying the rejected text.
    async fn generate_text(&mut self, prompt: &str, force_fresh: bool) -> Result<String, BroadcastError> {
        let temperature = self.config.llm.temperature.to_string();
        let key = fingerprint(
            EntryKind::Generation,
            &[prompt, self.config.llm.generation_model.as_str(), temperature.as_str()],
        );

        if !force_fresh {
            if let Ok(Some(cached)) = self.cache.get::<String>(EntryKind::Generation, &key) {
                return Ok(cached);
            }
        }

        let request = GenerationRequest {
            model: self.config.llm.generation_model.clone(),
            prompt: prompt.to_string(),
            temperature: self.config.llm.temperature,
            max_tokens: self.config.llm.max_tokens,
        };
        let response = self.generation_client.generate(&request).await?;
        let _ = self.cache.put(
            EntryKind::Generation,
            &key,
            &response.text,
            self.config.cache.ttl_generation_secs,
        );
        Ok(response.text)
    }

    /// Dispatches on the configured validation mode (spec §4.11: rules,
    /// llm, or hybrid are interchangeable strategies behind one contract).
    async fn validate(&self, text: &str) -> broadcast_core::ValidationReport {
        match self.config.validation.mode {
            ValidationMode::Rules => validate_rules(text, &self.personality, &self.config.validation),
            ValidationMode::Llm => {
                validate_llm(
                    text,
                    &self.personality,
                    &self.config.validation,
                    &self.config.llm.validation_model,
                    self.generation_client.as_ref(),
                )
                .await
            }
            ValidationMode::Hybrid => {
                validate_hybrid(
                    text,
                    &self.personality,
                    &self.config.validation,
                    &self.config.llm.validation_model,
                    self.generation_client.as_ref(),
                )
                .await
            }
        }
    }

    /// One turn of the pipeline (spec §4.13).
    pub async fn generate_next_segment(&mut self) -> Result<SegmentOutcome, BroadcastError> {
        if self.is_cancelled() {
            return Ok(SegmentOutcome::Cancelled);
        }

        let segment_type = schedule_next(
            self.world.snapshot().current_hour,
            &self.session_memory,
            &self.story_state,
            &self.config.story,
            &self.config.scheduler,
        );

        let (segment_type, story_timeline) = if segment_type == SegmentType::Story {
            match self.pick_story_timeline() {
                Some(timeline) => (SegmentType::Story, Some(timeline)),
                None => (SegmentType::Gossip, None),
            }
        } else {
            (segment_type, None)
        };

        let recent_subjects: Vec<String> = {
            let lookup = &self.subject_lookup;
            self.session_memory
                .recent_subjects(self.config.context.recent_subjects_window, |id| {
                    lookup.get(id).cloned().unwrap_or_default()
                })
        };

        let snapshot = self.world.snapshot();
        let notable_recent_weather = self.notable_recent_weather();

        let max_level = {
            let request = self.build_request(
                segment_type,
                story_timeline,
                &recent_subjects,
                &snapshot.weather,
                snapshot.current_hour,
                notable_recent_weather.clone(),
            );
            max_relax_level(&request)
        };

        let mut relax_level = 0usize;
        let mut chunks = Vec::new();
        loop {
            let assembled = {
                let request = self.build_request(
                    segment_type,
                    story_timeline,
                    &recent_subjects,
                    &snapshot.weather,
                    snapshot.current_hour,
                    notable_recent_weather.clone(),
                );
                assemble(request, relax_level)
            };
            chunks = self
                .retrieve(&assembled.retrieval_query, &assembled.retrieval_where, relax_level, max_level)
                .await;
            if !chunks.is_empty() || relax_level >= max_level.min(1) {
                if self.is_cancelled() {
                    return Ok(SegmentOutcome::Cancelled);
                }
                let chunk_refs: Vec<Chunk> = chunks.iter().map(|s| s.chunk.clone()).collect();
                for chunk in &chunk_refs {
                    self.subject_lookup.insert(chunk.chunk_id.clone(), chunk.primary_subjects.clone());
                }

                let prompt = render_prompt(segment_type, &self.personality, &assembled.template_vars, &chunk_refs);

                let mut text = match self.generate_text(&prompt, false).await {
                    Ok(text) => text,
                    Err(BroadcastError::Generation { attempts, message }) => {
                        self.summary.generation_failures += 1;
                        warn!(attempts, message = %message, "generation exhausted transport retries; skipping segment");
                        let index = self.segment_index;
                        self.segment_index += 1;
                        return Ok(SegmentOutcome::Skipped { segment_index: index, reason: message });
                    }
                    Err(other) => return Err(other),
                };

                let mut report = self.validate(&text).await;

                let mut attempt = 0;
                while !report.is_valid && attempt < self.config.validation.retries {
                    attempt += 1;
                    self.summary.validation_failures += 1;
                    text = self.generate_text(&prompt, true).await.unwrap_or(text);
                    report = self.validate(&text).await;
                }

                if self.is_cancelled() {
                    return Ok(SegmentOutcome::Cancelled);
                }

                if !report.is_valid {
                    if report.has_critical() {
                        self.summary.critical_violations += 1;
                        match self.config.validation.on_critical {
                            OnCriticalPolicy::Halt => {
                                let index = self.segment_index;
                                return Ok(SegmentOutcome::Halted {
                                    segment_index: index,
                                    reason: "critical rule violation survived all retries".to_string(),
                                });
                            }
                            OnCriticalPolicy::ContinueWithFlag => {
                                report.flags.push("unaccepted".to_string());
                            }
                            OnCriticalPolicy::Quarantine => {
                                report.flags.push("unaccepted".to_string());
                                report.flags.push("quarantined".to_string());
                            }
                        }
                    } else {
                        report.flags.push("quality-issue".to_string());
                    }
                }

                return self.commit(segment_type, story_timeline, text, chunk_refs, report).await;
            }
            relax_level += 1;
        }
    }

    async fn commit(
        &mut self,
        segment_type: SegmentType,
        story_timeline: Option<Timeline>,
        script_text: String,
        chunks_used: Vec<Chunk>,
        validation: broadcast_core::ValidationReport,
    ) -> Result<SegmentOutcome, BroadcastError> {
        let now = Utc::now();
        let hour = self.world.snapshot().current_hour;
        let tone = chunks_used.first().map(|c| c.emotional_tone).unwrap_or(broadcast_core::EmotionalTone::Neutral);

        if self.world.snapshot().weather.duration_remaining_hours == 0 {
            let rolled = next_weather(&self.world.snapshot().weather, self.segment_index);
            let notable = rolled.intensity >= 0.5;
            self.world.record_weather(WeatherEvent {
                weather: rolled,
                region: self.personality.region.clone(),
                occurred_at: now,
                notable,
            });
        }

        let weather_snapshot = if segment_type == SegmentType::Weather {
            Some(WeatherSnapshot { weather: self.world.snapshot().weather, region: self.personality.region.clone(), recorded_at: now })
        } else {
            None
        };

        let story_beat_ref = if let Some(timeline) = story_timeline {
            let story_id = self.story_state.active_story(timeline).map(|s| s.story_id.clone());
            let emitted_act = self.story_state.advance_beat(timeline, now);
            match (story_id, emitted_act) {
                (Some(story_id), Some(act_number)) => Some(StoryBeatRef { story_id, act_number }),
                _ => None,
            }
        } else {
            None
        };

        self.session_memory.record(RecentSegment {
            segment_type,
            script_text: script_text.clone(),
            hour,
            chunk_ids_used: chunks_used.iter().map(|c| c.chunk_id.clone()).collect(),
            tone,
            weather_snapshot,
            story_beat_ref: story_beat_ref.clone(),
            recorded_at: now,
        });

        if let Err(err) = self.freshness.mark_used(self.knowledge.as_ref(), &chunks_used, now).await {
            warn!(error = %err, "freshness mark_used failed; chunk repetition risk accepted");
        }

        self.world.increment_counter(segment_type.as_str());
        self.segments_in_current_hour += 1;
        if self.segments_in_current_hour >= self.config.scheduler.segments_per_hour {
            self.world.advance_hour();
            self.segments_in_current_hour = 0;
        }
        self.complexity_tier = self.complexity_tier.next();

        let still_referenced: std::collections::HashSet<ChunkId> = self
            .session_memory
            .last_k(self.session_memory.len())
            .into_iter()
            .flat_map(|s| s.chunk_ids_used.iter().cloned())
            .collect();
        self.subject_lookup.retain(|id, _| still_referenced.contains(id));

        let record = SegmentRecord {
            segment_index: self.segment_index,
            hour,
            segment_type,
            script_text,
            chunk_ids_used: chunks_used.iter().map(|c| c.chunk_id.clone()).collect(),
            validation: validation.clone(),
            story_ref: story_beat_ref.map(|r| r.story_id),
            timing_ms: 0,
        };
        self.segment_index += 1;
        self.summary.segments_committed += 1;

        if self.persist_checkpoint().await.is_err() {
            if self.persist_checkpoint().await.is_err() {
                return Err(BroadcastError::Persistence {
                    artifact: "checkpoint".to_string(),
                    message: "world/story state write failed twice".to_string(),
                });
            }
        }

        if !validation.flags.contains(&"quarantined".to_string()) {
            let _ = self.output_log.append(&record).await;
        }

        Ok(SegmentOutcome::Committed(record))
    }

    /// Per-segment lightweight checkpoint (spec §4.13 step 8). Retried
    /// once on failure; a second failure is the run's one unrecoverable
    /// condition (spec §7 `PersistenceError`).
    async fn persist_checkpoint(&self) -> anyhow::Result<()> {
        self.world.persist().await?;
        self.story_state.persist().await?;
        Ok(())
    }

    pub fn end(self) -> EngineSummary {
        self.summary
    }
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2102, 1, 1).unwrap()
}

fn default_start_weather() -> Weather {
    Weather { kind: WeatherType::Clear, intensity: 0.2, temperature_f: 55.0, duration_remaining_hours: 6 }
}

const WEATHER_ROTATION: [WeatherType; 6] = [
    WeatherType::Clear,
    WeatherType::Sunny,
    WeatherType::Overcast,
    WeatherType::Fog,
    WeatherType::Rainy,
    WeatherType::RadStorm,
];

/// Deterministically rolls `current` to the next weather event once its
/// duration expires, keyed off `seed` (the run's segment index) so a
/// resumed run reproduces the same weather sequence as an uninterrupted
/// one (spec §8 resume equivalence).
fn next_weather(current: &Weather, seed: u64) -> Weather {
    let current_index = WEATHER_ROTATION.iter().position(|k| *k == current.kind).unwrap_or(0);
    let step = 1 + (seed % (WEATHER_ROTATION.len() as u64 - 1)) as usize;
    let kind = WEATHER_ROTATION[(current_index + step) % WEATHER_ROTATION.len()];

    let (intensity, temperature_f) = match kind {
        WeatherType::RadStorm => (0.8, 48.0),
        WeatherType::Rainy => (0.6, 52.0),
        WeatherType::Overcast | WeatherType::Fog => (0.4, 58.0),
        WeatherType::Sunny => (0.2, 72.0),
        WeatherType::Clear => (0.2, 65.0),
    };
    let duration_remaining_hours = 4 + (seed % 5) as u32;

    Weather { kind, intensity, temperature_f, duration_remaining_hours }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broadcast_config::{DjConfig, PersistenceConfig};
    use broadcast_knowledge::InMemoryKnowledgeStore;
    use broadcast_llm::GenerationResponse;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct StubGenerationClient;

    #[async_trait]
    impl GenerationClient for StubGenerationClient {
        async fn generate(&self, _request: &GenerationRequest) -> Result<GenerationResponse, BroadcastError> {
            Ok(GenerationResponse {
                text: "Settlers gathered peacefully near the old bridge today, trading stories.".to_string(),
                prompt_tokens: 0,
                completion_tokens: 0,
            })
        }
    }

    fn sample_chunk(id: &str) -> Chunk {
        Chunk::new(
            id,
            "Raiders clashed with settlers near the old bridge last week.",
            2090,
            "appalachia",
            "event",
            broadcast_core::ConfidenceTier::High,
            broadcast_core::EmotionalTone::Tense,
            broadcast_core::ComplexityTier::Simple,
            vec!["raiders".to_string()],
            vec!["conflict".to_string()],
            broadcast_core::ControversyLevel::Neutral,
        )
    }

    async fn write_personality(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("julie.json");
        tokio::fs::write(
            &path,
            r#"{
                "name": "Julie",
                "year_dj": 2102,
                "region": "appalachia",
                "forbidden_factions": [],
                "forbidden_content_types": [],
                "region_allow": ["appalachia"],
                "catchphrases": ["Stay frosty"],
                "filler_words": [],
                "taboo_words": [],
                "default_mood": ["neutral"]
            }"#,
        )
        .await
        .unwrap();
        path
    }

    #[tokio::test]
    async fn start_seeds_pools_and_generate_next_segment_commits() {
        let dir = tempdir().unwrap();
        let personality_path = write_personality(dir.path()).await;

        let mut config = EngineConfig::default();
        config.dj = DjConfig { dj_name: "Julie".to_string(), personality_path: personality_path.to_string_lossy().to_string() };
        config.persistence = PersistenceConfig { state_dir: dir.path().join("state").to_string_lossy().to_string(), checkpoint_retain: 5 };

        let store: Arc<dyn KnowledgeStore> = Arc::new(InMemoryKnowledgeStore::new(vec![sample_chunk("c1"), sample_chunk("c2")]));
        let client: Arc<dyn GenerationClient> = Arc::new(StubGenerationClient);

        let mut orchestrator = Orchestrator::start(config, store, client).await.unwrap();
        let outcome = orchestrator.generate_next_segment().await.unwrap();
        match outcome {
            SegmentOutcome::Committed(record) => {
                assert_eq!(record.segment_index, 0);
                assert_eq!(record.segment_type, SegmentType::TimeCheck);
            }
            other => panic!("expected a committed segment, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_before_pipeline_skips_cleanly() {
        let dir = tempdir().unwrap();
        let personality_path = write_personality(dir.path()).await;

        let mut config = EngineConfig::default();
        config.dj = DjConfig { dj_name: "Julie".to_string(), personality_path: personality_path.to_string_lossy().to_string() };
        config.persistence = PersistenceConfig { state_dir: dir.path().join("state").to_string_lossy().to_string(), checkpoint_retain: 5 };

        let store: Arc<dyn KnowledgeStore> = Arc::new(InMemoryKnowledgeStore::new(vec![sample_chunk("c1")]));
        let client: Arc<dyn GenerationClient> = Arc::new(StubGenerationClient);

        let mut orchestrator = Orchestrator::start(config, store, client).await.unwrap();
        orchestrator.cancellation_handle().store(true, Ordering::SeqCst);
        let outcome = orchestrator.generate_next_segment().await.unwrap();
        assert!(matches!(outcome, SegmentOutcome::Cancelled));
    }

    #[test]
    fn next_weather_always_changes_kind_and_resets_duration() {
        let current = Weather { kind: WeatherType::Clear, intensity: 0.2, temperature_f: 65.0, duration_remaining_hours: 0 };
        let rolled = next_weather(&current, 3);
        assert_ne!(rolled.kind, current.kind);
        assert!(rolled.duration_remaining_hours > 0);
    }

    #[test]
    fn next_weather_is_deterministic_for_a_given_seed() {
        let current = Weather { kind: WeatherType::Rainy, intensity: 0.6, temperature_f: 52.0, duration_remaining_hours: 0 };
        let a = next_weather(&current, 7);
        let b = next_weather(&current, 7);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.duration_remaining_hours, b.duration_remaining_hours);
    }
}
