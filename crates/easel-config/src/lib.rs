#![allow(clippy::must_use_candidate)]

mod env;
pub mod health;
pub mod imagegen;
mod loader;
pub mod server;
pub mod telemetry;
pub mod webhook;

use serde::Deserialize;

pub use health::*;
pub use imagegen::*;
pub use server::*;
pub use telemetry::{LogFormat, TelemetryConfig};
pub use webhook::*;

/// Top-level Easel configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Image generation providers and routing
    #[serde(default)]
    pub imagegen: ImageGenConfig,
    /// Webhook delivery configuration
    #[serde(default)]
    pub webhook: WebhookConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
