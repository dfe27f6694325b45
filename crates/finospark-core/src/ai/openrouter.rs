//! OpenRouter backend
//!
//! Uses the OpenAI-style `/chat/completions` endpoint with a bearer key.
//! Reply text lives at `choices[0].message.content`.

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

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_MODEL: &str = "google/gemini-2.0-flash-exp:free";
const MAX_TOKENS: u32 = 1500;
const REFERER: &str = "https://finospark.app";
const APP_TITLE: &str = "FinoSpark";

/// OpenRouter backend
#[derive(Clone)]
pub struct OpenRouterBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl OpenRouterBackend {
    /// Create a backend against the public OpenRouter endpoint
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(OPENROUTER_BASE_URL, api_key)
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

    /// Pull the assistant message out of a chat completion body
    pub fn extract_reply(body: &str) -> std::result::Result<String, ProviderError> {
        let response: ChatCompletionResponse = parse_envelope(body)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::unexpected_shape("No choices in response", body))?;

        choice
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| ProviderError::unexpected_shape("No message content in first choice", body))
    }
}

/// OpenAI-style chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

/// Chat message
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// Chat completion choice
#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatResponseMessage>,
}

/// Chat response message
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LlmBackend for OpenRouterBackend {
    async fn complete(&self, prompt: &PromptPair) -> std::result::Result<String, ProviderError> {
        let request = ChatCompletionRequest {
            model: OPENROUTER_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let builder = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", APP_TITLE)
            .json(&request);

        let body = send(builder).await?;
        let reply = Self::extract_reply(&body)?;
        debug!("OpenRouter response: {}", reply);

        Ok(reply)
    }

    fn model(&self) -> &str {
        OPENROUTER_MODEL
    }

    fn name(&self) -> &'static str {
        "openrouter"
    }
}
