//! Transaction analysis handler

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::{info, warn};

use crate::{AppError, AppState};
use finospark_core::{AnalysisOutcome, AnalysisRequest};

const NO_PROVIDER: &str =
    "No LLM provider key configured. Set GOOGLE_API_KEY or OPENROUTER_API_KEY.";
const NO_TRANSACTIONS: &str = "At least one transaction is required for analysis";

/// POST /analyze - Analyze a batch of transactions
///
/// Success and analysis failures both answer 200; callers branch on the
/// `error` key. Only caller-side problems map to an error status.
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisOutcome>, AppError> {
    let analyzer = state
        .analyzer
        .as_ref()
        .ok_or_else(|| AppError::internal(NO_PROVIDER))?;

    if !state.limiter.allow(&request.user_id) {
        warn!(user_id = %request.user_id, "Rate limit exceeded");
        return Err(AppError::too_many_requests(
            &state.config.rate_limit.rejection_message(),
        ));
    }

    if request.transactions.is_empty() {
        return Err(AppError::bad_request(NO_TRANSACTIONS));
    }

    info!(
        user_id = %request.user_id,
        transactions = request.transactions.len(),
        "Analyzing transactions"
    );

    let outcome = analyzer.analyze(&request).await;
    if let Some(error) = outcome.error() {
        warn!(user_id = %request.user_id, "Analysis failed: {}", error.error);
    }

    Ok(Json(outcome))
}
