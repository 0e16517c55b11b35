//! Test server wrapper that starts Easel on a random port

use std::net::SocketAddr;
use std::time::Duration;

use easel_config::Config;
use easel_server::Server;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start a test server with the given configuration
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let server = Server::new(&config)?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self { addr, shutdown, client })
    }

    /// URL of a path on the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Submit a generation request and return the status code and body
    pub async fn generate(&self, body: &Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url("/api/v1/generate/image"))
            .json(body)
            .send()
            .await
            .unwrap();

        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    /// Fetch a task snapshot, `None` on 404
    pub async fn status(&self, task_id: &str) -> Option<Value> {
        let resp = self
            .client
            .get(self.url(&format!("/api/v1/status/{task_id}")))
            .send()
            .await
            .unwrap();

        if resp.status() == 404 {
            return None;
        }

        Some(resp.json().await.unwrap())
    }

    /// Poll the status endpoint until the task is completed or failed
    pub async fn wait_for_terminal(&self, task_id: &str) -> Value {
        for _ in 0..200 {
            if let Some(task) = self.status(task_id).await
                && matches!(task["status"].as_str(), Some("completed" | "failed"))
            {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        panic!("task {task_id} did not finish in time");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
