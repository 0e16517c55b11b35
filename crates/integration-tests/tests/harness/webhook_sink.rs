//! Webhook receiver that records every delivered task snapshot

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::{Json, Router, routing};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

pub struct WebhookSink {
    addr: SocketAddr,
    shutdown: CancellationToken,
    received: Arc<Mutex<Vec<Value>>>,
}

impl WebhookSink {
    pub async fn start() -> anyhow::Result<Self> {
        let received = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route("/hook", routing::post(handle_hook))
            .with_state(Arc::clone(&received));

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

        Ok(Self { addr, shutdown, received })
    }

    pub fn url(&self) -> String {
        format!("http://{}/hook", self.addr)
    }

    /// Statuses of received snapshots for one task, in arrival order
    pub fn statuses(&self, task_id: &str) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .filter(|task| task["task_id"] == task_id)
            .filter_map(|task| task["status"].as_str().map(str::to_owned))
            .collect()
    }

    /// Wait until `count` snapshots for the task have arrived
    pub async fn wait_for(&self, task_id: &str, count: usize) -> Vec<String> {
        for _ in 0..200 {
            let statuses = self.statuses(task_id);
            if statuses.len() >= count {
                return statuses;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        self.statuses(task_id)
    }
}

impl Drop for WebhookSink {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_hook(State(received): State<Arc<Mutex<Vec<Value>>>>, Json(task): Json<Value>) {
    received.lock().unwrap().push(task);
}
