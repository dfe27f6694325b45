//! Domain models for FinoSpark

use serde::{Deserialize, Serialize};

/// Currency assumed when a transaction does not carry one
pub const DEFAULT_CURRENCY: &str = "INR";

/// Savings plan horizon assumed when the model omits `period_days`
pub const DEFAULT_PERIOD_DAYS: i64 = 30;

/// A single spending entry submitted for analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction date (YYYY-MM-DD, passed through to the prompt as-is)
    pub date: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub note: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

/// Body of `POST /analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub user_id: String,
    pub transactions: Vec<Transaction>,
    /// Free-text context from the user
    #[serde(default)]
    pub notes: Option<String>,
}

/// Detected emotional tone of the spending pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Calm,
    Stressed,
    Anxious,
    Excited,
    Neutral,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Stressed => "stressed",
            Self::Anxious => "anxious",
            Self::Excited => "excited",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spending profile classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinancialProfile {
    Spender,
    Saver,
    Balanced,
    Investor,
}

impl FinancialProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spender => "spender",
            Self::Saver => "saver",
            Self::Balanced => "balanced",
            Self::Investor => "investor",
        }
    }
}

impl std::fmt::Display for FinancialProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A prioritized recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub desc: String,
    pub priority: i64,
}

/// Short-horizon savings micro-plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsPlan {
    pub target_amount: f64,
    #[serde(default = "default_period_days")]
    pub period_days: i64,
    pub steps: Vec<String>,
}

fn default_period_days() -> i64 {
    DEFAULT_PERIOD_DAYS
}

/// Fully validated analysis returned to the caller on success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub emotion: Emotion,
    pub financial_profile: FinancialProfile,
    /// Model confidence, always within [0.0, 1.0] after validation
    pub confidence: f64,
    pub top_insights: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub savings_plan: SavingsPlan,
}

/// Failure payload, returned with HTTP 200 just like a success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    /// Failure category
    pub error: String,
    /// Diagnostic message
    pub details: Option<String>,
    /// Provider text as received, for operator debugging
    pub raw_response: Option<String>,
}

impl ErrorResult {
    pub const EXTRACTION_FAILED: &'static str = "Failed to extract JSON from model response";
    pub const VALIDATION_FAILED: &'static str = "Validation failed";
    pub const UNEXPECTED_STRUCTURE: &'static str = "Unexpected API response structure";
    pub const UNEXPECTED_ERROR: &'static str = "Unexpected error during API call";

    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            raw_response: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_raw_response(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = Some(raw.into());
        self
    }

    /// No JSON could be recovered from the model reply
    pub fn extraction_failed(raw: &str) -> Self {
        Self::new(Self::EXTRACTION_FAILED)
            .with_details("The model did not return valid JSON")
            .with_raw_response(raw)
    }

    /// JSON was recovered but does not match the analysis schema
    pub fn validation_failed(details: impl Into<String>, raw: &str) -> Self {
        Self::new(Self::VALIDATION_FAILED)
            .with_details(details)
            .with_raw_response(raw)
    }
}

/// Either payload shape; serializes without a wrapper so callers branch on
/// the presence of the `error` key
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Success(AnalysisResult),
    Failure(ErrorResult),
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn error(&self) -> Option<&ErrorResult> {
        match self {
            Self::Success(_) => None,
            Self::Failure(e) => Some(e),
        }
    }
}

impl From<ErrorResult> for AnalysisOutcome {
    fn from(err: ErrorResult) -> Self {
        Self::Failure(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_defaults() {
        let tx: Transaction =
            serde_json::from_str(r#"{"date": "2025-10-20", "amount": 1500.0}"#).unwrap();
        assert_eq!(tx.currency, "INR");
        assert_eq!(tx.merchant, "");
        assert_eq!(tx.category, "");
        assert_eq!(tx.note, "");
    }

    #[test]
    fn test_request_notes_optional() {
        let req: AnalysisRequest = serde_json::from_str(
            r#"{"user_id": "u1", "transactions": [{"date": "2025-10-20", "amount": 1}]}"#,
        )
        .unwrap();
        assert_eq!(req.notes, None);
        assert_eq!(req.transactions.len(), 1);
    }

    #[test]
    fn test_error_result_serializes_nulls() {
        let json = serde_json::to_value(ErrorResult::new("boom")).unwrap();
        assert_eq!(json["error"], "boom");
        assert!(json["details"].is_null());
        assert!(json["raw_response"].is_null());
    }

    #[test]
    fn test_outcome_is_untagged() {
        let outcome: AnalysisOutcome = ErrorResult::extraction_failed("nope").into();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["error"], ErrorResult::EXTRACTION_FAILED);
        assert_eq!(json["raw_response"], "nope");
        assert!(json.get("Failure").is_none());
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_value(Emotion::Anxious).unwrap(), "anxious");
        assert_eq!(
            serde_json::to_value(FinancialProfile::Investor).unwrap(),
            "investor"
        );
        assert_eq!(Emotion::Calm.to_string(), "calm");
    }
}
