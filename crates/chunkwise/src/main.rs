//! Main entry point for the chunkwise CLI

use anyhow::Context;
use chunkwise::cli::{Cli, Command};
use chunkwise::config::load_config;
use chunkwise::handlers::{models_handler, summarize_handler};
use chunkwise::logging::{init_logging, resolve_log_dir};
use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    chunkwise_common::initialize_environment();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    // Command-line flags override the file and environment
    if cli.json_logs {
        config.telemetry.json_logs = true;
    }

    let log_dir = resolve_log_dir(cli.log_dir.clone(), &config.telemetry);
    let _guards = init_logging(&config.telemetry, &log_dir)
        .with_context(|| format!("cannot create log directory '{}'", log_dir.display()))?;
    debug!(log_dir = %log_dir.display(), "Logging initialized");

    match cli.command {
        Command::Summarize(args) => summarize_handler(&args, &config).await,
        Command::Models { json } => models_handler(&config, json, &mut std::io::stdout().lock()),
    }
}
