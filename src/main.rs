mod commands;
mod render;
mod utils;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "calsync")]
#[command(about = "Keep a task database calendar and a scheduling calendar in sync")]
struct Cli {
    /// Show every event and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync pass
    Sync,
    /// Show what the next sync pass would change, without changing anything
    Status,
    /// Run sync passes on an interval until interrupted
    Watch {
        /// Time between passes (e.g. "90s", "5m"); defaults to watch_interval from the config
        #[arg(long, value_parser = humantime::parse_duration)]
        every: Option<Duration>,
    },
    /// Show configuration paths and sources
    Config,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Sync => commands::sync::run(cli.verbose).await,
        Commands::Status => commands::status::run(cli.verbose).await,
        Commands::Watch { every } => commands::watch::run(every, cli.verbose).await,
        Commands::Config => commands::config::run(),
    }
}
