//! Sentinel CLI: the operator entry point.
//!
//! Commands:
//! - `health`      Check that the backend answers
//! - `ask`         Ask a mission question with captured map context
//! - `ask-marker`  Ask about a single marker
//! - `config`      Show, initialise, or edit the backend config

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentinel_config::FileConfigStore;

mod commands;

#[derive(Parser)]
#[command(
    name = "sentinel",
    about = "Sentinel: mission analysis for field operators",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to use instead of ~/.sentinel/config.toml
    #[arg(long, global = true, env = "SENTINEL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the configured backend is reachable
    Health,

    /// Ask a question about the current mission
    Ask(commands::ask::AskArgs),

    /// Ask about a single marker
    AskMarker(commands::ask_marker::AskMarkerArgs),

    /// Manage the backend configuration
    Config {
        #[command(subcommand)]
        action: commands::config_cmd::ConfigAction,
    },
}

impl Cli {
    fn store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::new(path),
            None => FileConfigStore::at_default_location(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let store = cli.store();
    match cli.command {
        Commands::Health => commands::health::run(store).await?,
        Commands::Ask(args) => commands::ask::run(store, args).await?,
        Commands::AskMarker(args) => commands::ask_marker::run(store, args).await?,
        Commands::Config { action } => commands::config_cmd::run(store, action)?,
    }

    Ok(())
}
