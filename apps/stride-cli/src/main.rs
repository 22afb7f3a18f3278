//! # stride-cli
//!
//! Command-line interface for Stride health goal tracking.
//!
//! - `stride goal create/list/show` — define and inspect goals
//! - `stride goal progress` — record progress (events go to the bus)
//! - `stride goal start/cancel/delete` — lifecycle commands
//!
//! State lives under `.stride/` in the data root: one JSON file per goal,
//! one JSONL topic file per event topic.

mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::StrideConfig;
use stride_events::{EventPublisher, JsonlTransport};
use stride_goal::{GoalService, JsonGoalStore};

/// Stride — track health goals and announce their lifecycle.
#[derive(Parser)]
#[command(name = "stride", version, about)]
struct Cli {
    /// Data root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    data_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage goals.
    Goal {
        #[command(subcommand)]
        command: commands::goal::GoalCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interfere with command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("stride_goal=info".parse()?)
                .add_directive("stride_events=info".parse()?)
                .add_directive("stride_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config = StrideConfig::load(&cli.data_root)?;
    tracing::debug!(
        goals_dir = %config.goals_dir.display(),
        events_dir = %config.events_dir.display(),
        "stride starting"
    );

    // All goal operations publish through the process-wide handle.
    let transport = Arc::new(JsonlTransport::new(&config.events_dir, config.partitions)?);
    stride_events::install(EventPublisher::with_timeout(transport, config.send_timeout));
    let publisher = stride_events::global()
        .ok_or_else(|| anyhow::anyhow!("event publisher not installed"))?;

    let store = Arc::new(JsonGoalStore::new(&config.goals_dir)?);
    let service = GoalService::new(store, publisher.clone());

    let result = match &cli.command {
        Commands::Goal { command } => commands::goal::execute(command, &service),
    };

    // Flush in-flight sends before exit.
    publisher.shutdown().await;

    result
}
