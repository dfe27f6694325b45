//! Test utilities for finospark-core
//!
//! This module provides a mock LLM provider server that answers both the
//! Gemini and the OpenRouter endpoints with a canned reply, and records what
//! it was sent so tests can assert on the outbound request.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Canned answer returned for every request
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
    /// Wait this long before answering
    pub delay: Option<Duration>,
}

impl MockReply {
    /// 200 with a Gemini `generateContent` envelope around `text`
    pub fn gemini_text(text: &str) -> Self {
        let body = json!({
            "candidates": [{
                "content": {"parts": [{"text": text}], "role": "model"},
                "finishReason": "STOP"
            }]
        });
        Self::status(200, &body.to_string())
    }

    /// 200 with an OpenRouter chat completion envelope around `text`
    pub fn openrouter_text(text: &str) -> Self {
        let body = json!({
            "id": "gen-mock",
            "model": "mock",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        });
        Self::status(200, &body.to_string())
    }

    /// Arbitrary status and raw body
    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    /// Stall before answering, to simulate a slow upstream
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// What the mock server received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    /// Request body as JSON, `Value::Null` if it was not JSON
    pub body: Value,
}

struct MockState {
    reply: MockReply,
    hits: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock LLM provider server for tests
pub struct MockProviderServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockProviderServer {
    /// Start the mock server on an available port
    pub async fn start(reply: MockReply) -> Self {
        let state = Arc::new(MockState {
            reply,
            hits: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/models/:model", post(handle_completion))
            .route("/chat/completions", post(handle_completion))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of requests served so far
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Most recent request, if any
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.requests.lock().unwrap().last().cloned()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockProviderServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_completion(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let recorded = RecordedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    state.requests.lock().unwrap().push(recorded);

    if let Some(delay) = state.reply.delay {
        tokio::time::sleep(delay).await;
    }

    let status =
        StatusCode::from_u16(state.reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        state.reply.body.clone(),
    )
}
