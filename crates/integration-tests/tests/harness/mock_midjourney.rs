//! Mock Midjourney proxy for integration tests
//!
//! Serves an account list, accepts imagine submissions and reports each
//! task as in progress for a fixed number of polls before succeeding

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Mock Midjourney proxy
pub struct MockMidjourney {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockMidjourneyState>,
}

struct MockMidjourneyState {
    accounts: Value,
    /// Polls answered with `IN_PROGRESS` before `SUCCESS`
    polls_before_success: u32,
    submit_count: AtomicU32,
    poll_count: AtomicU32,
    submitted_accounts: Mutex<Vec<String>>,
}

impl MockMidjourney {
    /// Start a proxy with the given account list JSON
    pub async fn start(accounts: Value, polls_before_success: u32) -> anyhow::Result<Self> {
        let state = Arc::new(MockMidjourneyState {
            accounts,
            polls_before_success,
            submit_count: AtomicU32::new(0),
            poll_count: AtomicU32::new(0),
            submitted_accounts: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/account/list", routing::get(handle_accounts))
            .route("/submit/imagine", routing::post(handle_submit))
            .route("/task/{task_id}/fetch", routing::get(handle_fetch))
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

    /// Base URL of the proxy
    pub fn api_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn submit_count(&self) -> u32 {
        self.state.submit_count.load(Ordering::Relaxed)
    }

    pub fn poll_count(&self) -> u32 {
        self.state.poll_count.load(Ordering::Relaxed)
    }

    /// Account ids carried by each submission, in order
    pub fn submitted_accounts(&self) -> Vec<String> {
        self.state.submitted_accounts.lock().unwrap().clone()
    }

    /// URL returned for a task
    pub fn image_url(task_id: &str) -> String {
        format!("https://mj.mock/{task_id}.png")
    }
}

impl Drop for MockMidjourney {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("mj-api-secret").and_then(|v| v.to_str().ok()) == Some("mj-test-key")
}

async fn handle_accounts(State(state): State<Arc<MockMidjourneyState>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    Json(state.accounts.clone()).into_response()
}

async fn handle_submit(State(state): State<Arc<MockMidjourneyState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let n = state.submit_count.fetch_add(1, Ordering::Relaxed) + 1;

    if let Some(account) = body["account_id"].as_str() {
        state.submitted_accounts.lock().unwrap().push(account.to_owned());
    }

    Json(json!({
        "code": 1,
        "description": "Submitted",
        "result": format!("task-{n}")
    }))
    .into_response()
}

async fn handle_fetch(State(state): State<Arc<MockMidjourneyState>>, Path(task_id): Path<String>) -> Json<Value> {
    let polls = state.poll_count.fetch_add(1, Ordering::Relaxed);

    if polls < state.polls_before_success {
        return Json(json!({"id": task_id, "status": "IN_PROGRESS", "progress": "50%"}));
    }

    Json(json!({
        "id": task_id,
        "status": "SUCCESS",
        "progress": "100%",
        "imageUrl": MockMidjourney::image_url(&task_id)
    }))
}
