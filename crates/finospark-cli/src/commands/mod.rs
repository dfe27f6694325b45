//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `analyze` - Analysis commands (analyze, recover) and request loading
//! - `prompt` - Prompt preview command
//! - `serve` - Web server command

pub mod analyze;
pub mod prompt;
pub mod serve;

// Re-export command functions for main.rs
pub use analyze::*;
pub use prompt::*;
pub use serve::*;
