//! Schema validation and the analysis service
//!
//! `respond` is the single place raw model text becomes either an
//! `AnalysisResult` or an `ErrorResult`. Every failure kind is reported as
//! data; nothing on this path panics or escalates.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ai::{recover_json, AIClient, LlmBackend, Strategy};
use crate::error::Result;
use crate::models::{AnalysisOutcome, AnalysisRequest, AnalysisResult, ErrorResult};
use crate::prompts::PromptBuilder;

/// Why a recovered value is not a valid analysis
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{0}")]
    Schema(#[from] serde_json::Error),

    #[error("{0} must be an object")]
    NotAnObject(String),

    #[error("confidence must be between 0.0 and 1.0, got {0}")]
    ConfidenceOutOfRange(f64),
}

/// Check a recovered value against the analysis schema
///
/// All-or-nothing: missing fields, wrong types and unknown enum values are
/// all rejected. Extra fields are ignored.
pub fn validate(value: Value) -> std::result::Result<AnalysisResult, ValidationError> {
    require_objects(&value)?;
    let result: AnalysisResult = serde_json::from_value(value)?;

    if !(0.0..=1.0).contains(&result.confidence) {
        return Err(ValidationError::ConfidenceOutOfRange(result.confidence));
    }

    Ok(result)
}

/// Reject arrays where the schema has objects
///
/// serde's derived struct deserializer also fills fields by position from a
/// sequence, so `["calm", "saver", ...]` would otherwise validate.
fn require_objects(value: &Value) -> std::result::Result<(), ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::NotAnObject("analysis".to_string()));
    }

    if let Some(plan) = value.get("savings_plan") {
        if !plan.is_object() {
            return Err(ValidationError::NotAnObject("savings_plan".to_string()));
        }
    }

    if let Some(Value::Array(recommendations)) = value.get("recommendations") {
        if let Some(i) = recommendations.iter().position(|r| !r.is_object()) {
            return Err(ValidationError::NotAnObject(format!("recommendations[{}]", i)));
        }
    }

    Ok(())
}

/// Whether a recovered value carries nothing to validate
///
/// `null`, `false`, zero, and empty strings, arrays or objects count as
/// "no JSON extracted" rather than as a schema violation.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Turn raw model text into the outcome returned to the caller
pub fn respond(raw: &str) -> AnalysisOutcome {
    respond_with_strategy(raw).0
}

/// Like `respond`, also reporting which recovery strategy found the JSON
pub fn respond_with_strategy(raw: &str) -> (AnalysisOutcome, Option<Strategy>) {
    let Some(recovered) = recover_json(raw).filter(|r| !is_blank(&r.value)) else {
        warn!("No JSON could be recovered from model response");
        return (ErrorResult::extraction_failed(raw).into(), None);
    };
    debug!(strategy = %recovered.strategy, "Recovered JSON from model response");

    let outcome = match validate(recovered.value) {
        Ok(result) => AnalysisOutcome::Success(result),
        Err(e) => {
            warn!("Model response failed validation: {}", e);
            ErrorResult::validation_failed(e.to_string(), raw).into()
        }
    };
    (outcome, Some(recovered.strategy))
}

/// Runs one analysis end to end: prompt, provider call, recovery, validation
#[derive(Clone)]
pub struct Analyzer {
    client: AIClient,
}

impl Analyzer {
    pub fn new(client: AIClient) -> Self {
        Self { client }
    }

    /// Build an analyzer from environment credentials
    ///
    /// Returns `Ok(None)` when no provider is configured.
    pub fn from_env() -> Result<Option<Self>> {
        let client = AIClient::from_env()?;
        if let Some(client) = &client {
            info!(
                "Using {} provider with model {}",
                client.name(),
                client.model()
            );
        }
        Ok(client.map(Self::new))
    }

    pub fn client(&self) -> &AIClient {
        &self.client
    }

    /// Analyze a batch of transactions
    ///
    /// Makes exactly one provider call. Upstream failures come back as an
    /// `ErrorResult` rather than an `Err`.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        let prompt = PromptBuilder::build(request);
        debug!(
            user_id = %request.user_id,
            transactions = request.transactions.len(),
            "Sending analysis prompt to {}",
            self.client.name()
        );

        match self.client.complete(&prompt).await {
            Ok(raw) => respond(&raw),
            Err(e) => {
                warn!("LLM provider call failed: {}", e);
                ErrorResult::from(e).into()
            }
        }
    }
}
