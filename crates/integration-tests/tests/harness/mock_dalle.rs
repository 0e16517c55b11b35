//! Mock DALL-E backend for integration tests

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Mock DALL-E endpoint with a scripted number of failures
pub struct MockDalle {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockDalleState>,
}

struct MockDalleState {
    request_count: AtomicU32,
    /// Requests still to be answered with 500
    fail_remaining: AtomicU32,
    /// Answer successes with `{"data": []}` instead of a URL
    empty: bool,
}

impl MockDalle {
    /// Start a backend that always succeeds
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0, false).await
    }

    /// Start a backend that fails the first `n` requests with 500
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n, false).await
    }

    /// Start a backend that answers without any image
    pub async fn start_empty() -> anyhow::Result<Self> {
        Self::start_inner(0, true).await
    }

    async fn start_inner(fail_count: u32, empty: bool) -> anyhow::Result<Self> {
        let state = Arc::new(MockDalleState {
            request_count: AtomicU32::new(0),
            fail_remaining: AtomicU32::new(fail_count),
            empty,
        });

        let app = Router::new()
            .route("/v1/images/generations", routing::post(handle_generate))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Full generation endpoint URL
    pub fn api_url(&self) -> String {
        format!("http://{}/v1/images/generations", self.addr)
    }

    /// Number of generation requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// URL returned for a prompt
    pub fn image_url(prompt: &str) -> String {
        format!("https://dalle.mock/{}.png", prompt.replace(' ', "-"))
    }
}

impl Drop for MockDalle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_generate(State(state): State<Arc<MockDalleState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer test-key") {
        return (StatusCode::UNAUTHORIZED, "missing bearer token").into_response();
    }

    let should_fail = state
        .fail_remaining
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
        .is_ok();

    if should_fail {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Server Error").into_response();
    }

    if state.empty {
        return Json(json!({"created": 1, "data": []})).into_response();
    }

    let prompt = body["prompt"].as_str().unwrap_or_default();

    Json(json!({
        "created": 1_700_000_000,
        "data": [{"url": MockDalle::image_url(prompt), "revised_prompt": prompt}]
    }))
    .into_response()
}
