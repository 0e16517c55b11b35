use std::{sync::Arc, time::Duration};

use easel_config::{DalleConfig, ImageGenConfig, MidjourneyConfig, ProviderKind};

use crate::{
    error::{ImageGenError, Result},
    provider::{DalleProvider, ImageProvider, MidjourneyProvider, midjourney::PollSettings},
    router::{ImageRouter, RouterConfig},
    types::CallPolicy,
};

/// Builder for constructing the image router from configuration
pub struct ImageRouterBuilder<'a> {
    config: &'a ImageGenConfig,
}

impl<'a> ImageRouterBuilder<'a> {
    pub const fn new(config: &'a ImageGenConfig) -> Self {
        Self { config }
    }

    pub fn build(self) -> Result<ImageRouter> {
        let router_config = RouterConfig::from(&self.config.router);
        let mut router = ImageRouter::new(router_config.clone());

        for kind in self.config.providers.configured() {
            tracing::debug!("Initializing image provider: {kind}");

            let provider: Arc<dyn ImageProvider> = match kind {
                ProviderKind::Dalle => {
                    let config = section(kind, self.config.providers.dalle.as_ref())?;
                    Arc::new(dalle(config, &router_config)?)
                }
                ProviderKind::Midjourney => {
                    let config = section(kind, self.config.providers.midjourney.as_ref())?;
                    Arc::new(midjourney(config, &router_config))
                }
            };

            router.register(provider)?;
        }

        if !router.is_registered(router_config.default_provider) {
            return Err(ImageGenError::ConfigError(format!(
                "default provider '{}' is not configured",
                router_config.default_provider
            )));
        }

        tracing::debug!(
            "Image router initialized with {} provider(s)",
            router.providers().count()
        );

        Ok(router)
    }
}

fn section<T>(kind: ProviderKind, section: Option<&T>) -> Result<&T> {
    section.ok_or_else(|| ImageGenError::ConfigError(format!("missing settings for provider '{kind}'")))
}

fn policy(
    router: &RouterConfig,
    timeout: u64,
    max_retries: Option<u32>,
    retry_delay: Option<u64>,
) -> CallPolicy {
    let mut policy = router.call_policy(Duration::from_secs(timeout));

    if let Some(max_retries) = max_retries {
        policy.max_retries = max_retries;
    }

    if let Some(retry_delay) = retry_delay {
        policy.retry_delay = Duration::from_secs(retry_delay);
    }

    policy
}

fn dalle(config: &DalleConfig, router: &RouterConfig) -> Result<DalleProvider> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| ImageGenError::ConfigError("API key required for provider 'dalle'".to_string()))?;

    Ok(DalleProvider::new(
        config.api_url.clone(),
        api_key,
        config.default_model.clone(),
        policy(router, config.timeout, config.max_retries, config.retry_delay),
    ))
}

fn midjourney(config: &MidjourneyConfig, router: &RouterConfig) -> MidjourneyProvider {
    MidjourneyProvider::new(
        &config.api_url,
        config.api_key.clone(),
        policy(router, config.timeout, config.max_retries, config.retry_delay),
        PollSettings {
            max_attempts: config.poll_max_attempts,
            interval: Duration::from_secs(config.poll_interval),
        },
    )
}
