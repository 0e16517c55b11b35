use std::{collections::HashSet, fmt, str::FromStr, sync::Arc, time::Duration};

use easel_config::{ErrorKind, ProviderKind, RouterSettings};
use indexmap::IndexMap;

use crate::{
    error::{ImageGenError, Result},
    provider::ImageProvider,
    types::{CallPolicy, ImageRequest, ImageUrl, RequestOverrides},
};

/// Provider selection and fallback policy
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub default_provider: ProviderKind,
    pub fallback_provider: Option<ProviderKind>,
    /// Executor attempts for providers without their own setting
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Error classes that trigger the single fallback attempt
    pub fallback_on: HashSet<ErrorKind>,
}

impl RouterConfig {
    pub fn new(default_provider: ProviderKind) -> Self {
        Self::from(&RouterSettings {
            default_provider,
            ..RouterSettings::default()
        })
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: ProviderKind) -> Self {
        self.fallback_provider = Some(fallback);
        self
    }

    /// Whether an error of this kind may be retried on the fallback provider
    pub fn falls_back_on(&self, kind: ErrorKind) -> bool {
        kind != ErrorKind::ProviderNotFound && self.fallback_on.contains(&kind)
    }

    /// Default call policy for a provider with the given timeout
    pub const fn call_policy(&self, timeout: Duration) -> CallPolicy {
        CallPolicy {
            timeout,
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
        }
    }
}

impl From<&RouterSettings> for RouterConfig {
    fn from(settings: &RouterSettings) -> Self {
        Self {
            default_provider: settings.default_provider,
            fallback_provider: settings.fallback_provider,
            max_retries: settings.max_retries,
            retry_delay: Duration::from_secs(settings.retry_delay),
            fallback_on: settings.fallback_on.iter().copied().collect(),
        }
    }
}

/// Routes generation requests to registered providers
///
/// Registration happens once at startup; afterwards the router is only
/// read and can be shared freely.
pub struct ImageRouter {
    config: RouterConfig,
    providers: IndexMap<ProviderKind, Arc<dyn ImageProvider>>,
}

impl fmt::Debug for ImageRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageRouter")
            .field("config", &self.config)
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ImageRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self {
            config,
            providers: IndexMap::new(),
        }
    }

    /// Register a provider under its own kind
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the kind is already registered
    pub fn register(&mut self, provider: Arc<dyn ImageProvider>) -> Result<()> {
        let kind = provider.kind();

        if self.providers.contains_key(&kind) {
            return Err(ImageGenError::ConfigError(format!(
                "provider '{kind}' is already registered"
            )));
        }

        tracing::debug!(provider = %kind, "registered image provider");
        self.providers.insert(kind, provider);

        Ok(())
    }

    pub const fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn is_registered(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }

    /// Registered kinds in registration order
    pub fn providers(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        self.providers.keys().copied()
    }

    /// Resolve a provider key from a caller
    ///
    /// `None` selects the default provider. Unknown or unregistered keys
    /// are rejected without touching any backend.
    pub fn resolve(&self, provider: Option<&str>) -> Result<ProviderKind> {
        let kind = match provider {
            None => self.config.default_provider,
            Some(key) => ProviderKind::from_str(key).map_err(|_| ImageGenError::ProviderNotFound(key.to_string()))?,
        };

        if !self.is_registered(kind) {
            return Err(ImageGenError::ProviderNotFound(kind.to_string()));
        }

        Ok(kind)
    }

    /// Generate an image from a prompt
    ///
    /// Builds the request, resolves the provider and delegates to
    /// [`ImageRouter::route_request`].
    pub async fn route(&self, prompt: &str, provider: Option<&str>, overrides: RequestOverrides) -> Result<Option<ImageUrl>> {
        let kind = self.resolve(provider)?;
        let request = ImageRequest::new(prompt)?.with_params(overrides);

        self.route_request(kind, &request).await
    }

    /// Run a request against one provider, falling back at most once
    ///
    /// The fallback runs only for error kinds in the fallback set, and only
    /// when the fallback provider is registered and differs from the
    /// primary. Its outcome is returned as is.
    pub async fn route_request(&self, kind: ProviderKind, request: &ImageRequest) -> Result<Option<ImageUrl>> {
        let provider = self
            .providers
            .get(&kind)
            .ok_or_else(|| ImageGenError::ProviderNotFound(kind.to_string()))?;

        let error = match provider.generate(request).await {
            Ok(url) => return Ok(url),
            Err(e) => e,
        };

        let Some(fallback) = self.fallback_for(kind, &error) else {
            return Err(error);
        };

        tracing::warn!(
            provider = %kind,
            fallback = %fallback.kind(),
            status = error.status_code(),
            error = %error,
            "primary image provider failed, attempting fallback"
        );

        fallback.generate(request).await.inspect_err(|e| {
            tracing::warn!(
                provider = %fallback.kind(),
                error = %e,
                "fallback image provider also failed"
            );
        })
    }

    fn fallback_for(&self, primary: ProviderKind, error: &ImageGenError) -> Option<&Arc<dyn ImageProvider>> {
        if !self.config.falls_back_on(error.kind()) {
            return None;
        }

        self.config
            .fallback_provider
            .filter(|fallback| *fallback != primary)
            .and_then(|fallback| self.providers.get(&fallback))
    }
}
