//! CLI argument definitions using clap
//!
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// FinoSpark - Emotion-aware financial insights from transactions
#[derive(Parser)]
#[command(name = "finospark")]
#[command(about = "Analyze spending transactions with an LLM", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    ///
    /// The provider is chosen from GOOGLE_API_KEY or OPENROUTER_API_KEY.
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Analyze transactions from a JSON request file
    Analyze {
        /// Request file (same body as POST /analyze)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Run JSON recovery and validation on a captured model reply
    Recover {
        /// File holding the raw model text
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the system and user prompts for a request file
    Prompt {
        /// Request file (same body as POST /analyze)
        #[arg(short, long)]
        file: PathBuf,
    },
}
