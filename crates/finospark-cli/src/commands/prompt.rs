//! Prompt preview command

use std::path::Path;

use anyhow::Result;
use finospark_core::PromptBuilder;

use super::load_request;

/// Print the prompts that would be sent for a request file
pub fn cmd_prompt(file: &Path) -> Result<()> {
    let request = load_request(file)?;
    let prompt = PromptBuilder::build(&request);

    println!("=== System ===\n");
    println!("{}", prompt.system);
    println!("\n=== User ===\n");
    println!("{}", prompt.user);

    Ok(())
}
