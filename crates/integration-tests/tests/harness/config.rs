//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use easel_config::{
    Config, DalleConfig, ErrorKind, HealthConfig, MidjourneyConfig, ProviderKind, ServerConfig, WebhookConfig,
};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults and instant retries
    pub fn new() -> Self {
        let mut config = Config {
            server: ServerConfig {
                listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                health: HealthConfig::default(),
            },
            webhook: WebhookConfig {
                max_retries: 1,
                retry_delay: 0,
                ..WebhookConfig::default()
            },
            ..Config::default()
        };

        config.imagegen.router.retry_delay = 0;

        Self { config }
    }

    /// Add a DALL-E provider pointed at a mock backend
    pub fn with_dalle(mut self, api_url: &str) -> Self {
        self.config.imagegen.providers.dalle = Some(DalleConfig {
            api_url: api_url.to_owned(),
            api_key: Some(SecretString::from("test-key".to_owned())),
            default_model: "dall-e-3".to_owned(),
            timeout: 5,
            max_retries: None,
            retry_delay: None,
        });
        self
    }

    /// Add a Midjourney provider pointed at a mock proxy
    pub fn with_midjourney(mut self, api_url: &str, poll_max_attempts: u32) -> Self {
        self.config.imagegen.providers.midjourney = Some(MidjourneyConfig {
            api_url: api_url.to_owned(),
            api_key: Some(SecretString::from("mj-test-key".to_owned())),
            timeout: 5,
            max_retries: Some(1),
            retry_delay: None,
            poll_max_attempts,
            poll_interval: 0,
        });
        self
    }

    pub fn default_provider(mut self, kind: ProviderKind) -> Self {
        self.config.imagegen.router.default_provider = kind;
        self
    }

    pub fn fallback_provider(mut self, kind: ProviderKind) -> Self {
        self.config.imagegen.router.fallback_provider = Some(kind);
        self
    }

    pub fn fallback_on(mut self, kinds: Vec<ErrorKind>) -> Self {
        self.config.imagegen.router.fallback_on = kinds;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.imagegen.router.max_retries = max_retries;
        self
    }

    pub fn webhook_default_url(mut self, url: &str) -> Self {
        self.config.webhook.default_url = Some(url.to_owned());
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config, validated the same way as a loaded file
    pub fn build(self) -> Config {
        self.config.validate().expect("test config is valid");
        self.config
    }
}
