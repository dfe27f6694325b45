//! Analysis command implementations

use std::path::Path;

use anyhow::{bail, Context, Result};
use finospark_core::{respond_with_strategy, AnalysisOutcome, AnalysisRequest, Analyzer, Strategy};

/// Load and check an analysis request file
pub fn load_request(path: &Path) -> Result<AnalysisRequest> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let request: AnalysisRequest = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid analysis request in {}", path.display()))?;

    if request.transactions.is_empty() {
        bail!("At least one transaction is required for analysis");
    }

    Ok(request)
}

/// Run one analysis against the configured provider
pub async fn cmd_analyze(file: &Path) -> Result<()> {
    let request = load_request(file)?;

    let Some(analyzer) = Analyzer::from_env().context("Failed to configure LLM provider")? else {
        bail!("No LLM provider key configured. Set GOOGLE_API_KEY or OPENROUTER_API_KEY.");
    };

    let outcome = analyzer.analyze(&request).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}

/// Run recovery and validation over a captured reply file
pub fn recover_file(file: &Path) -> Result<(AnalysisOutcome, Option<Strategy>)> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    Ok(respond_with_strategy(&raw))
}

/// Show how a captured `raw_response` would be recovered
pub fn cmd_recover(file: &Path) -> Result<()> {
    let (outcome, strategy) = recover_file(file)?;
    match strategy {
        Some(strategy) => eprintln!("Recovered with strategy: {}", strategy),
        None => eprintln!("No strategy recovered JSON"),
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
