mod run;

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use broadcast_config::EngineConfig;

#[derive(Debug, Parser)]
#[command(name = "broadcast-radio", version, about = "Wasteland Radio broadcast engine")]
struct Cli {
    /// Path to the engine's TOML config file.
    #[arg(long, default_value = "broadcast.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run indefinitely until cancelled (Ctrl-C).
    Start {
        #[arg(long)]
        dj: Option<String>,
        /// Resume from the last checkpoint in `persistence.state_dir`
        /// instead of starting a fresh WorldState/StoryState.
        #[arg(long)]
        from_checkpoint: bool,
    },
    /// Generate exactly N segments, then exit.
    Run {
        #[arg(long)]
        segments: u64,
        #[arg(long)]
        dj: Option<String>,
        #[arg(long)]
        from_checkpoint: bool,
    },
    /// Print the persisted WorldState and StoryState for the configured
    /// state directory without starting the engine.
    InspectCheckpoint,
}

fn init_tracing(config: &EngineConfig) {
    let filter = EnvFilter::try_new(&config.telemetry.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.telemetry.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut config = EngineConfig::load_from(&cli.config)?;
    init_tracing(&config);

    match cli.command {
        Commands::Start { dj, from_checkpoint } => {
            if let Some(dj) = dj {
                config.dj.dj_name = dj;
            }
            if !from_checkpoint {
                clear_checkpoint(&config.persistence.state_dir).await?;
            }
            run::run_until_cancelled(config).await
        }
        Commands::Run { segments, dj, from_checkpoint } => {
            if segments == 0 {
                bail!("--segments must be at least 1");
            }
            if let Some(dj) = dj {
                config.dj.dj_name = dj;
            }
            if !from_checkpoint {
                clear_checkpoint(&config.persistence.state_dir).await?;
            }
            run::run_n_segments(config, segments).await
        }
        Commands::InspectCheckpoint => run::inspect_checkpoint(&config.persistence.state_dir).await,
    }
}

/// Removes the persisted checkpoint artifacts so a fresh `start`/`run`
/// doesn't resume stale WorldState/StoryState (spec §5: resuming from a
/// checkpoint is opt-in via `--from-checkpoint`).
async fn clear_checkpoint(state_dir: &str) -> Result<()> {
    let dir = Path::new(state_dir);
    for name in ["world_state.json", "story_state.json"] {
        let path = dir.join(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::remove_file(&path).await?;
        }
    }
    Ok(())
}
