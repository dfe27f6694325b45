//! FinoSpark Core Library
//!
//! Shared functionality for the FinoSpark transaction analyzer:
//! - Request and analysis result models
//! - Prompt builder for the analysis instruction and transaction listing
//! - Pluggable LLM providers (Gemini, OpenRouter, mock)
//! - JSON recovery engine for free-text model replies
//! - Schema validation and the uniform success/error responder

pub mod ai;
pub mod analysis;
pub mod error;
pub mod models;
pub mod prompts;

/// Test utilities including a mock LLM provider server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    recover_json, AIClient, GeminiBackend, LlmBackend, MockBackend, OpenRouterBackend,
    ProviderError, Recovered, Strategy,
};
pub use analysis::{respond, respond_with_strategy, validate, Analyzer, ValidationError};
pub use error::{Error, Result};
pub use models::{
    AnalysisOutcome, AnalysisRequest, AnalysisResult, Emotion, ErrorResult, FinancialProfile,
    Recommendation, SavingsPlan, Transaction,
};
pub use prompts::{PromptBuilder, PromptPair};
