//! Server command implementation

use anyhow::{Context, Result};
use finospark_core::{Analyzer, LlmBackend};
use finospark_server::ServerConfig;

pub async fn cmd_serve(host: &str, port: u16) -> Result<()> {
    let analyzer = Analyzer::from_env().context("Failed to configure LLM provider")?;
    let config = ServerConfig::from_env();

    println!("🚀 Starting FinoSpark web server...");
    println!("   Listening: http://{}:{}", host, port);
    match &analyzer {
        Some(analyzer) => println!(
            "   Provider: {} ({})",
            analyzer.client().name(),
            analyzer.client().model()
        ),
        None => {
            println!("   ⚠️  No provider configured - /analyze will return 500");
            println!("      Set GOOGLE_API_KEY or OPENROUTER_API_KEY");
        }
    }
    if config.allowed_origins.is_empty() {
        println!("   CORS: any origin");
    } else {
        println!("   CORS: {}", config.allowed_origins.join(", "));
    }
    println!();

    finospark_server::serve(analyzer, host, port, config).await
}
