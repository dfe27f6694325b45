//! Pluggable LLM provider abstraction
//!
//! Two hosted providers can answer an analysis prompt. They differ only in
//! request/response envelopes, so each backend is responsible for a single
//! capability: send a prompt pair and return the model's raw reply text.
//!
//! # Architecture
//!
//! - `LlmBackend` trait: the one operation every provider implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OpenRouterBackend`, `MockBackend`
//! - `recovery`: turns the raw reply into a JSON value
//!
//! # Configuration
//!
//! Environment variables (checked in this order, first non-empty wins):
//! - `GOOGLE_API_KEY`: use Gemini `generateContent`
//! - `OPENROUTER_API_KEY`: use OpenRouter chat completions
//! - `AI_BACKEND=mock`: deterministic in-process mock (development only)
//!
//! The provider is chosen once at construction; every request reuses it.

mod gemini;
mod mock;
mod openrouter;
pub mod recovery;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use openrouter::OpenRouterBackend;
pub use recovery::{recover_json, Recovered, Strategy};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use thiserror::Error;
use tracing::warn;

use crate::error::Result;
use crate::models::ErrorResult;
use crate::prompts::PromptPair;

/// Upper bound for a single upstream call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sampling temperature sent to both providers
pub const TEMPERATURE: f32 = 0.2;

/// Why an upstream call produced no reply text
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Timeout, connection failure, or any other transport problem
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status
    #[error("upstream returned status {status}")]
    Status { status: u16, body: String },

    /// The envelope parsed but the reply text is not where it should be
    #[error("{details}")]
    UnexpectedShape { details: String, raw: String },

    /// A 2xx body that is not JSON at all
    #[error("invalid response body: {details}")]
    MalformedBody { details: String, raw: String },
}

impl ProviderError {
    pub(crate) fn unexpected_shape(details: &str, raw: &str) -> Self {
        Self::UnexpectedShape {
            details: details.to_string(),
            raw: raw.to_string(),
        }
    }
}

impl From<ProviderError> for ErrorResult {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Transport(e) => {
                ErrorResult::new(ErrorResult::UNEXPECTED_ERROR).with_details(e.to_string())
            }
            ProviderError::Status { status, body } => {
                ErrorResult::new(format!("API request failed with status {}", status))
                    .with_details(format!("upstream returned status {}", status))
                    .with_raw_response(body)
            }
            ProviderError::UnexpectedShape { details, raw } => {
                ErrorResult::new(ErrorResult::UNEXPECTED_STRUCTURE)
                    .with_details(details)
                    .with_raw_response(raw)
            }
            ProviderError::MalformedBody { details, raw } => {
                ErrorResult::new(ErrorResult::UNEXPECTED_ERROR)
                    .with_details(details)
                    .with_raw_response(raw)
            }
        }
    }
}

/// Trait defining the interface for all LLM backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Send the prompt and return the model's raw reply text
    ///
    /// Exactly one upstream request is made; failures are not retried.
    async fn complete(&self, prompt: &PromptPair) -> std::result::Result<String, ProviderError>;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Short provider name (for logging and health output)
    fn name(&self) -> &'static str;
}

/// Build an HTTP client with the given upstream timeout applied
pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Send a request and return the response body of a 2xx answer
///
/// Non-2xx answers become `ProviderError::Status` carrying the upstream body.
/// Transport errors drop the request URL, which may carry an API key.
pub(crate) async fn send(request: RequestBuilder) -> std::result::Result<String, ProviderError> {
    let response = request.send().await.map_err(reqwest::Error::without_url)?;
    let status = response.status();
    let body = response.text().await.map_err(reqwest::Error::without_url)?;

    if !status.is_success() {
        warn!(status = status.as_u16(), "LLM provider returned an error status");
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

/// Parse a 2xx body into a typed envelope
pub(crate) fn parse_envelope<T: serde::de::DeserializeOwned>(
    body: &str,
) -> std::result::Result<T, ProviderError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ProviderError::MalformedBody {
            details: e.to_string(),
            raw: body.to_string(),
        })?;

    serde_json::from_value(value).map_err(|e| ProviderError::UnexpectedShape {
        details: e.to_string(),
        raw: body.to_string(),
    })
}

/// Concrete LLM client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini `generateContent`
    Gemini(GeminiBackend),
    /// OpenRouter chat completions
    OpenRouter(OpenRouterBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create a client from environment variables
    ///
    /// Returns `Ok(None)` when no provider credential is configured.
    pub fn from_env() -> Result<Option<Self>> {
        if std::env::var("AI_BACKEND")
            .map(|b| b.eq_ignore_ascii_case("mock"))
            .unwrap_or(false)
        {
            return Ok(Some(Self::mock()));
        }

        Self::from_keys(
            std::env::var("GOOGLE_API_KEY").ok(),
            std::env::var("OPENROUTER_API_KEY").ok(),
        )
    }

    /// Select a provider from explicit credentials
    ///
    /// Gemini wins when both are present; blank keys count as missing.
    pub fn from_keys(
        google_api_key: Option<String>,
        openrouter_api_key: Option<String>,
    ) -> Result<Option<Self>> {
        let present = |key: Option<String>| key.filter(|k| !k.trim().is_empty());

        if let Some(key) = present(google_api_key) {
            return Ok(Some(Self::Gemini(GeminiBackend::new(&key)?)));
        }
        if let Some(key) = present(openrouter_api_key) {
            return Ok(Some(Self::OpenRouter(OpenRouterBackend::new(&key)?)));
        }
        Ok(None)
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }
}

// Implement LlmBackend for AIClient by delegating to the inner backend
#[async_trait]
impl LlmBackend for AIClient {
    async fn complete(&self, prompt: &PromptPair) -> std::result::Result<String, ProviderError> {
        match self {
            AIClient::Gemini(b) => b.complete(prompt).await,
            AIClient::OpenRouter(b) => b.complete(prompt).await,
            AIClient::Mock(b) => b.complete(prompt).await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::OpenRouter(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AIClient::Gemini(b) => b.name(),
            AIClient::OpenRouter(b) => b.name(),
            AIClient::Mock(b) => b.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.name(), "mock");
    }

    #[test]
    fn test_from_keys_prefers_gemini() {
        let client = AIClient::from_keys(Some("g".into()), Some("o".into()))
            .unwrap()
            .unwrap();
        assert!(matches!(client, AIClient::Gemini(_)));
        assert_eq!(client.name(), "gemini");
    }

    #[test]
    fn test_from_keys_falls_back_to_openrouter() {
        let client = AIClient::from_keys(Some("  ".into()), Some("o".into()))
            .unwrap()
            .unwrap();
        assert!(matches!(client, AIClient::OpenRouter(_)));
    }

    #[test]
    fn test_from_keys_none_configured() {
        assert!(AIClient::from_keys(None, None).unwrap().is_none());
        assert!(AIClient::from_keys(Some(String::new()), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_status_error_result() {
        let result: ErrorResult = ProviderError::Status {
            status: 503,
            body: "overloaded".into(),
        }
        .into();
        assert_eq!(result.error, "API request failed with status 503");
        assert_eq!(result.raw_response.as_deref(), Some("overloaded"));
    }

    #[test]
    fn test_shape_error_result() {
        let result: ErrorResult =
            ProviderError::unexpected_shape("No choices in response", "{}").into();
        assert_eq!(result.error, ErrorResult::UNEXPECTED_STRUCTURE);
        assert_eq!(result.details.as_deref(), Some("No choices in response"));
        assert_eq!(result.raw_response.as_deref(), Some("{}"));
    }

    #[test]
    fn test_request_timeout() {
        assert_eq!(REQUEST_TIMEOUT, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_envelope_rejects_non_json() {
        let err = parse_envelope::<serde_json::Value>("<html>").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedBody { .. }));
    }
}
