//! Google Gemini backend
//!
//! Calls `models/{model}:generateContent` with the API key as a query
//! parameter. Gemini has no separate system role on this endpoint, so the
//! system and user prompts travel as one text part.
//!
//! Reply text lives at `candidates[0].content.parts[0].text`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::prompts::PromptPair;

use super::{
    http_client, parse_envelope, send, LlmBackend, ProviderError, REQUEST_TIMEOUT, TEMPERATURE,
};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";
const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiBackend {
    /// Create a backend against the public Gemini endpoint
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(GEMINI_BASE_URL, api_key)
    }

    /// Create a backend against a different host (mock servers in tests)
    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self> {
        Self::with_timeout(base_url, api_key, REQUEST_TIMEOUT)
    }

    /// Create a backend with a non-default upstream timeout
    pub fn with_timeout(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http_client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Pull the reply text out of a `generateContent` response body
    pub fn extract_reply(body: &str) -> std::result::Result<String, ProviderError> {
        let response: GenerateContentResponse = parse_envelope(body)?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::unexpected_shape("No candidates in response", body))?;

        candidate
            .content
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| {
                ProviderError::unexpected_shape("No text part in first candidate", body)
            })
    }
}

/// Gemini generateContent request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

/// Gemini generateContent response
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn complete(&self, prompt: &PromptPair) -> std::result::Result<String, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.combined()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let builder = self
            .http_client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, GEMINI_MODEL
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&request);

        let body = send(builder).await?;
        let reply = Self::extract_reply(&body)?;
        debug!("Gemini response: {}", reply);

        Ok(reply)
    }

    fn model(&self) -> &str {
        GEMINI_MODEL
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::SYSTEM_PROMPT;
    use crate::test_utils::{MockProviderServer, MockReply};

    fn prompt() -> PromptPair {
        PromptPair {
            system: SYSTEM_PROMPT.to_string(),
            user: "Analyze these financial transactions for user u1".to_string(),
        }
    }

    #[test]
    fn test_extract_reply() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "{\"a\": 1}"}], "role": "model"}}]}"#;
        assert_eq!(GeminiBackend::extract_reply(body).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_reply_without_candidates() {
        let err = GeminiBackend::extract_reply(r#"{"promptFeedback": {}}"#).unwrap_err();
        match err {
            ProviderError::UnexpectedShape { details, raw } => {
                assert_eq!(details, "No candidates in response");
                assert!(raw.contains("promptFeedback"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_extract_reply_without_text() {
        let err = GeminiBackend::extract_reply(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#)
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnexpectedShape { .. }));
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let server = MockProviderServer::start(MockReply::gemini_text("hello")).await;
        let backend = GeminiBackend::with_base_url(&server.url(), "test-key").unwrap();

        let reply = backend.complete(&prompt()).await.unwrap();
        assert_eq!(reply, "hello");

        let request = server.last_request().unwrap();
        assert_eq!(request.path, format!("/models/{}:generateContent", GEMINI_MODEL));
        assert_eq!(request.query.as_deref(), Some("key=test-key"));
        let text = request.body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.starts_with(SYSTEM_PROMPT));
        assert_eq!(request.body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[tokio::test]
    async fn test_complete_error_status_single_attempt() {
        let server = MockProviderServer::start(MockReply::status(503, "overloaded")).await;
        let backend = GeminiBackend::with_base_url(&server.url(), "test-key").unwrap();

        let err = backend.complete(&prompt()).await.unwrap_err();
        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(server.hits(), 1);
    }

    #[tokio::test]
    async fn test_complete_times_out_on_stalled_upstream() {
        let reply = MockReply::gemini_text("late").with_delay(Duration::from_secs(5));
        let server = MockProviderServer::start(reply).await;
        let backend =
            GeminiBackend::with_timeout(&server.url(), "test-key", Duration::from_millis(100))
                .unwrap();

        let err = backend.complete(&prompt()).await.unwrap_err();
        match err {
            ProviderError::Transport(e) => {
                assert!(e.is_timeout());
                assert!(!e.to_string().contains("test-key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(server.hits(), 1);
    }
}
