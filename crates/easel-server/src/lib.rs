#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
pub mod events;
mod routes;
pub mod tasks;
pub mod webhook;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use easel_config::Config;
use tower_http::trace::TraceLayer;

pub use error::ServerError;
pub use events::TaskEvents;
pub use routes::{AppState, GenerateImageRequest, api_router};
pub use tasks::{MemoryTaskStore, Task, TaskStatus, TaskStore};
pub use webhook::{HttpWebhookNotifier, WebhookNotifier};

/// Prefix for task endpoints
pub const API_PREFIX: &str = "/api/v1";

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the image router cannot be built from the
    /// configured providers
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

        let image_router = easel_imagegen::build_router(config)?;
        let store: Arc<dyn TaskStore> = Arc::new(MemoryTaskStore::new());
        let events = TaskEvents::new(Arc::new(HttpWebhookNotifier::new(&config.webhook)));

        let state = AppState::new(image_router, store, events);

        let mut app = Router::new().nest(API_PREFIX, api_router(state));

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(routes::health_handler));
        }

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Replace the listen address, e.g. from a command-line override
    #[must_use]
    pub fn with_listen_address(mut self, listen_address: SocketAddr) -> Self {
        self.listen_address = listen_address;
        self
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered. Background
    /// generation tasks are not awaited.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
