//! cadence - scheduler をデモデータで動かす CLI
//!
//! - `cadence tick`: tick を 1 回だけ実行して結果を表示
//! - `cadence run`: Ctrl-C まで一定間隔で tick を回す

mod demo;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use cadence_core::app::SchedulerBuilder;
use cadence_core::config::SchedulerConfig;
use cadence_core::domain::TickOutcome;
use cadence_core::impls::{InMemoryCredentialStore, InMemoryStore, MediaPublisher};
use cadence_core::ports::{RandomSource, SeededRandom, SystemClock, ThreadRandom, UlidGenerator};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(name = "cadence")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file. `CADENCE_*` variables override its values.
    #[arg(long, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Seed for random channel draws (reproducible runs).
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the scheduler loop until Ctrl-C.
    Run,
    /// Run a single tick and print the report.
    Tick,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("cadence=info".parse()?)
                .add_directive("cadence_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SchedulerConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SchedulerConfig::default(),
    }
    .with_env_overrides()?;

    let store = Arc::new(InMemoryStore::new());
    let credentials = Arc::new(InMemoryCredentialStore::new());
    demo::seed(
        &store,
        &credentials,
        &UlidGenerator::new(SystemClock),
        &SystemClock,
    )
    .await;

    let random: Arc<dyn RandomSource> = match cli.seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    };
    let publisher = MediaPublisher::new(
        demo::LoggingMediaApi::default(),
        config.media_handle_prefix.clone(),
    );

    let scheduler = SchedulerBuilder::new(config)
        .store(store)
        .publisher(Arc::new(publisher))
        .credentials(credentials)
        .random(random)
        .build()?;

    match cli.command {
        Command::Tick => match scheduler.tick_once().await {
            TickOutcome::Completed(report) => {
                println!("{}", serde_json::to_string_pretty(&report.counts())?);
                for tenant in &report.tenants {
                    if let Some(reason) = &tenant.skipped {
                        println!("{} skipped: {reason}", tenant.tenant_id);
                    }
                    for failed in &tenant.failed {
                        println!("{} failed: {failed}", tenant.tenant_id);
                    }
                }
            }
            TickOutcome::Overlapped => println!("a tick is already running"),
        },
        Command::Run => {
            let handle = scheduler.spawn();
            tokio::signal::ctrl_c().await?;
            info!("shutting down");
            handle.shutdown_and_join().await;
        }
    }

    Ok(())
}
