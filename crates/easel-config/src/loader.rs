use std::path::Path;

use secrecy::ExposeSecret;

use crate::{Config, ProviderKind};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no provider is configured, the router names a
    /// provider without settings, or provider settings are unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_has_providers()?;
        self.validate_router()?;
        self.validate_providers()?;
        Ok(())
    }

    fn validate_has_providers(&self) -> anyhow::Result<()> {
        if self.imagegen.providers.configured().is_empty() {
            anyhow::bail!("at least one image generation provider must be configured (dalle or midjourney)");
        }

        Ok(())
    }

    fn validate_router(&self) -> anyhow::Result<()> {
        let router = &self.imagegen.router;
        let providers = &self.imagegen.providers;

        if !providers.is_configured(router.default_provider) {
            anyhow::bail!(
                "default provider '{}' has no [imagegen.providers.{}] section",
                router.default_provider,
                router.default_provider
            );
        }

        if let Some(fallback) = router.fallback_provider {
            if fallback == router.default_provider {
                anyhow::bail!("fallback provider must differ from the default provider ('{fallback}')");
            }

            if !providers.is_configured(fallback) {
                anyhow::bail!("fallback provider '{fallback}' has no [imagegen.providers.{fallback}] section");
            }
        }

        Ok(())
    }

    fn validate_providers(&self) -> anyhow::Result<()> {
        if let Some(ref dalle) = self.imagegen.providers.dalle {
            if dalle.api_url.trim().is_empty() {
                anyhow::bail!("provider '{}' requires a non-empty api_url", ProviderKind::Dalle);
            }

            let has_key = dalle.api_key.as_ref().is_some_and(|k| !k.expose_secret().is_empty());
            if !has_key {
                anyhow::bail!("API key required for image generation provider '{}'", ProviderKind::Dalle);
            }
        }

        if let Some(ref midjourney) = self.imagegen.providers.midjourney {
            if midjourney.api_url.trim().is_empty() {
                anyhow::bail!("provider '{}' requires a non-empty api_url", ProviderKind::Midjourney);
            }

            if midjourney.poll_max_attempts == 0 {
                anyhow::bail!("midjourney poll_max_attempts must be greater than 0");
            }
        }

        Ok(())
    }
}
