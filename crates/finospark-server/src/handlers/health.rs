//! Liveness and provider status handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use finospark_core::LlmBackend;

/// Service banner
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// GET / - Liveness banner
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "healthy",
        service: "FinoSpark",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Provider status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider_configured: bool,
    pub provider: Option<&'static str>,
    pub model: Option<String>,
    /// Unix time in seconds
    pub timestamp: f64,
}

/// GET /health - Report whether an LLM provider is configured
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let client = state.analyzer.as_ref().map(|a| a.client());

    Json(HealthResponse {
        status: "healthy",
        provider_configured: client.is_some(),
        provider: client.map(|c| c.name()),
        model: client.map(|c| c.model().to_string()),
        timestamp: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
    })
}
