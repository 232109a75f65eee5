//! Drives the orchestrator loop (spec §4.13 `start`/`generate_next_segment`
//! driven from an outer caller), mirroring the teacher's `daemon.rs` "load
//! config, build the runtime, drive it until told to stop" shape without
//! the socket/unified-daemon machinery this engine has no use for.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use broadcast_config::{EngineConfig, KnowledgeBackend};
use broadcast_core::persist::read_json;
use broadcast_core::world::WorldState;
use broadcast_engine::{Orchestrator, SegmentOutcome};
use broadcast_knowledge::{HttpVectorStore, InMemoryKnowledgeStore, KnowledgeStore};
use broadcast_llm::{GenerationClient, OllamaGenerationClient};
use broadcast_story::StoryStateData;

/// Builds the `KnowledgeStore` named by `config.knowledge.backend` (spec §6
/// "Vector corpus backend (consumed)").
async fn build_knowledge_store(config: &EngineConfig) -> Result<Arc<dyn KnowledgeStore>> {
    match config.knowledge.backend {
        KnowledgeBackend::Http => {
            let timeout = Duration::from_secs(config.knowledge.timeout_secs);
            Ok(Arc::new(HttpVectorStore::new(config.knowledge.http_base_url.clone(), timeout)))
        }
        KnowledgeBackend::LocalFile => {
            let path = Path::new(&config.knowledge.local_corpus_path);
            let chunks = if tokio::fs::try_exists(path).await.unwrap_or(false) {
                let raw = tokio::fs::read_to_string(path).await?;
                serde_json::from_str(&raw)?
            } else {
                warn!(path = %path.display(), "local corpus file not found; starting with an empty knowledge store");
                Vec::new()
            };
            Ok(Arc::new(InMemoryKnowledgeStore::new(chunks)))
        }
    }
}

fn build_generation_client(config: &EngineConfig) -> Arc<dyn GenerationClient> {
    Arc::new(OllamaGenerationClient::new(
        config.llm.base_url.clone(),
        Duration::from_secs(config.llm.timeout_generation_secs),
        config.llm.transport_retries,
    ))
}

async fn start_orchestrator(config: EngineConfig) -> Result<Orchestrator> {
    let knowledge = build_knowledge_store(&config).await?;
    let generation_client = build_generation_client(&config);
    Orchestrator::start(config, knowledge, generation_client).await
}

fn log_outcome(outcome: &SegmentOutcome) {
    match outcome {
        SegmentOutcome::Committed(record) => {
            info!(segment_index = record.segment_index, segment_type = ?record.segment_type, "segment committed");
        }
        SegmentOutcome::Skipped { segment_index, reason } => {
            warn!(segment_index, reason = %reason, "segment skipped");
        }
        SegmentOutcome::Cancelled => {
            info!("generation cancelled");
        }
        SegmentOutcome::Halted { segment_index, reason } => {
            warn!(segment_index, reason = %reason, "run halted on critical rule violation");
        }
    }
}

/// Drives the pipeline until Ctrl-C or a `Halted` outcome (spec §5
/// "Cancellation").
pub async fn run_until_cancelled(config: EngineConfig) -> Result<()> {
    let mut orchestrator = start_orchestrator(config).await?;
    let cancel = orchestrator.cancellation_handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    });

    loop {
        let outcome = orchestrator.generate_next_segment().await?;
        log_outcome(&outcome);
        if matches!(outcome, SegmentOutcome::Cancelled | SegmentOutcome::Halted { .. }) {
            break;
        }
    }

    let summary = orchestrator.end();
    print_summary(&summary);
    Ok(())
}

/// Generates exactly `segments` segments, then exits (stopping early on
/// cancellation or a halt).
pub async fn run_n_segments(config: EngineConfig, segments: u64) -> Result<()> {
    let mut orchestrator = start_orchestrator(config).await?;

    for _ in 0..segments {
        let outcome = orchestrator.generate_next_segment().await?;
        log_outcome(&outcome);
        if matches!(outcome, SegmentOutcome::Cancelled | SegmentOutcome::Halted { .. }) {
            break;
        }
    }

    let summary = orchestrator.end();
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &broadcast_engine::EngineSummary) {
    println!("── run summary ──────────────────────────────────────");
    println!("  segments committed     : {}", summary.segments_committed);
    println!("  segments skipped       : {}", summary.segments_skipped);
    println!("  generation failures    : {}", summary.generation_failures);
    println!("  validation failures    : {}", summary.validation_failures);
    println!("  critical violations    : {}", summary.critical_violations);
    println!("  pool seeding degraded  : {}", summary.pool_seeding_degraded);
    println!("  retrieval soft failures: {}", summary.retrieval_soft_failures);
}

/// Prints the persisted WorldState and StoryState without starting the
/// engine (spec's operator surface: `inspect-checkpoint`).
pub async fn inspect_checkpoint(state_dir: &str) -> Result<()> {
    let dir = Path::new(state_dir);

    match read_json::<WorldState>(&dir.join("world_state.json")).await? {
        Some(world) => {
            println!("── world state ──────────────────────────────────────");
            println!("  calendar       : {}", world.calendar);
            println!("  hour           : {}", world.current_hour);
            println!("  weather        : {:?} ({} hours remaining)", world.weather.kind, world.weather.duration_remaining_hours);
            println!("  weather events : {}", world.weather_history.len());
            for (segment_type, count) in &world.broadcast_counters {
                println!("  {segment_type:<14} : {count}");
            }
        }
        None => println!("no world_state.json checkpoint found in {state_dir}"),
    }

    println!();

    match read_json::<StoryStateData>(&dir.join("story_state.json")).await? {
        Some(story) => {
            println!("── story state ──────────────────────────────────────");
            for (timeline, pool) in &story.pools {
                println!("  {timeline:?} pool      : {} stories waiting", pool.len());
            }
            for (timeline, active) in &story.active {
                println!("  {timeline:?} active    : \"{}\" (act {}/{})", active.title, active.current_act_index + 1, active.acts.len());
            }
            for (timeline, count) in &story.completed_counts {
                println!("  {timeline:?} completed : {count}");
            }
            println!("  beat history entries: {}", story.history.len());
        }
        None => println!("no story_state.json checkpoint found in {state_dir}"),
    }

    Ok(())
}
