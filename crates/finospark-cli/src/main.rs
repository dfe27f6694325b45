//! FinoSpark CLI - Emotion-aware transaction analysis
//!
//! Usage:
//!   finospark serve --port 8000          Start web server
//!   finospark analyze --file req.json    Run one analysis
//!   finospark recover --file reply.txt   Replay recovery on a captured reply
//!   finospark prompt --file req.json     Show the prompts that would be sent

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Serve { host, port } => commands::cmd_serve(&host, port).await,
        Commands::Analyze { file } => commands::cmd_analyze(&file).await,
        Commands::Recover { file } => commands::cmd_recover(&file),
        Commands::Prompt { file } => commands::cmd_prompt(&file),
    }
}
