//! Mock backend for testing
//!
//! Returns a canned reply without touching the network. Useful for unit
//! tests and for running the server locally without a provider key.

use async_trait::async_trait;

use crate::prompts::PromptPair;

use super::{LlmBackend, ProviderError};

/// Reply returned by `MockBackend::new`
pub const MOCK_ANALYSIS: &str = r#"{
  "emotion": "calm",
  "financial_profile": "balanced",
  "confidence": 0.8,
  "top_insights": ["Spending is concentrated in a few categories", "Most purchases are small"],
  "recommendations": [
    {"title": "Set a weekly budget", "desc": "Cap discretionary spending each week", "priority": 1},
    {"title": "Review subscriptions", "desc": "Cancel services you rarely use", "priority": 2},
    {"title": "Automate savings", "desc": "Move a fixed amount on payday", "priority": 3}
  ],
  "savings_plan": {
    "target_amount": 2000.0,
    "period_days": 30,
    "steps": ["Track every purchase", "Skip one takeaway a week", "Transfer savings every Friday"]
  }
}"#;

/// Mock LLM backend
///
/// Returns the configured reply for every prompt.
#[derive(Clone)]
pub struct MockBackend {
    reply: String,
}

impl MockBackend {
    /// Create a mock that answers with a valid analysis
    pub fn new() -> Self {
        Self::with_reply(MOCK_ANALYSIS)
    }

    /// Create a mock that answers with arbitrary text
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, _prompt: &PromptPair) -> Result<String, ProviderError> {
        Ok(self.reply.clone())
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
