//! FinoSpark Web Server
//!
//! Axum-based REST API in front of the FinoSpark analyzer.
//!
//! - `GET /` and `GET /health` for liveness and provider status
//! - `POST /analyze` runs one transaction analysis
//! - Per-user sliding-window rate limiting on `/analyze`
//! - Permissive CORS unless origins are configured

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use finospark_core::{Analyzer, LlmBackend};

mod handlers;
pub mod rate_limit;

pub use rate_limit::{RateLimitConfig, RateLimiter, SlidingWindowLimiter};

/// Server configuration
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = any origin)
    pub allowed_origins: Vec<String>,
    /// Per-user limit on `/analyze`
    pub rate_limit: RateLimitConfig,
}

impl ServerConfig {
    /// Read `FINOSPARK_ALLOWED_ORIGINS` and the rate limit variables
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("FINOSPARK_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            allowed_origins,
            rate_limit: RateLimitConfig::from_env(),
        }
    }
}

/// Shared application state
pub struct AppState {
    /// `None` when no provider credential is configured
    pub analyzer: Option<Analyzer>,
    pub limiter: Arc<dyn RateLimiter>,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(analyzer: Option<Analyzer>, config: ServerConfig) -> Router {
    let limiter = Arc::new(SlidingWindowLimiter::new(config.rate_limit));
    create_router_with_limiter(analyzer, config, limiter)
}

/// Create the application router with a custom rate limiter
pub fn create_router_with_limiter(
    analyzer: Option<Analyzer>,
    config: ServerConfig,
    limiter: Arc<dyn RateLimiter>,
) -> Router {
    let cors = build_cors(&config.allowed_origins);

    let state = Arc::new(AppState {
        analyzer,
        limiter,
        config,
    });

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/analyze", post(handlers::analyze))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn build_cors(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    cors.allow_origin(origins)
}

/// Start the server
pub async fn serve(
    analyzer: Option<Analyzer>,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    match &analyzer {
        Some(analyzer) => info!(
            "LLM provider configured: {} (model: {})",
            analyzer.client().name(),
            analyzer.client().model()
        ),
        None => warn!(
            "No LLM provider configured (set GOOGLE_API_KEY or OPENROUTER_API_KEY); /analyze will return 500"
        ),
    }
    info!(
        "Rate limit: {} requests per {}s per user",
        config.rate_limit.max_requests,
        config.rate_limit.window.as_secs()
    );

    let app = create_router(analyzer, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
        }
    }

    pub fn too_many_requests(msg: &str) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: msg.to_string(),
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "detail": self.message
        }));

        (self.status, body).into_response()
    }
}
