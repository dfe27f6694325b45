//! HTTP request handlers organized by domain

pub mod analyze;
pub mod health;

// Re-export all handlers for use in router
pub use analyze::*;
pub use health::*;
