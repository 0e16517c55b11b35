use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Top-level image generation configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageGenConfig {
    /// Provider selection and fallback policy
    #[serde(default)]
    pub router: RouterSettings,
    /// Per-backend settings
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Supported image generation backends
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    /// `OpenAI` DALL-E
    Dalle,
    /// Midjourney proxy with account pool and task polling
    Midjourney,
}

/// Error classes a router can be told to fall back on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Connection, DNS or timeout failure talking to a backend
    Network,
    /// Non-2xx response or an in-body failure code
    Backend,
    /// No backend resource free to accept work
    Capacity,
    /// Task polling ran out of attempts
    Timeout,
    /// Caller supplied unusable input
    InvalidRequest,
    /// Provider key is unknown or not registered
    ProviderNotFound,
    /// Startup configuration is unusable
    Config,
}

/// Router policy
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterSettings {
    /// Provider used when a request names none
    #[serde(default = "default_provider")]
    pub default_provider: ProviderKind,
    /// Provider tried once when the first attempt fails with a fallback error
    #[serde(default)]
    pub fallback_provider: Option<ProviderKind>,
    /// Executor attempts for providers that do not set their own
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Executor delay in seconds for providers that do not set their own
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,
    /// Error classes that trigger the fallback provider
    #[serde(default = "default_fallback_on")]
    pub fallback_on: Vec<ErrorKind>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            fallback_provider: None,
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            fallback_on: default_fallback_on(),
        }
    }
}

/// Settings for every supported backend; absent sections are not registered
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub dalle: Option<DalleConfig>,
    #[serde(default)]
    pub midjourney: Option<MidjourneyConfig>,
}

impl ProvidersConfig {
    /// Kinds that have a configuration section, in registration order
    pub fn configured(&self) -> Vec<ProviderKind> {
        let mut kinds = Vec::new();

        if self.dalle.is_some() {
            kinds.push(ProviderKind::Dalle);
        }

        if self.midjourney.is_some() {
            kinds.push(ProviderKind::Midjourney);
        }

        kinds
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Dalle => self.dalle.is_some(),
            ProviderKind::Midjourney => self.midjourney.is_some(),
        }
    }
}

/// DALL-E backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DalleConfig {
    /// Full URL of the image generation endpoint
    #[serde(default = "default_dalle_url")]
    pub api_url: String,
    /// Bearer token
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Model used when the request does not name one
    #[serde(default = "default_dalle_model")]
    pub default_model: String,
    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub retry_delay: Option<u64>,
}

/// Midjourney proxy backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MidjourneyConfig {
    /// Base URL of the proxy (`/submit/imagine`, `/task/{id}/fetch` are appended)
    pub api_url: String,
    /// Sent as `mj-api-secret` when present
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub retry_delay: Option<u64>,
    /// Task status fetches before giving up
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,
    /// Seconds between task status fetches
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

const fn default_provider() -> ProviderKind {
    ProviderKind::Dalle
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_delay() -> u64 {
    1
}

fn default_fallback_on() -> Vec<ErrorKind> {
    vec![ErrorKind::Network, ErrorKind::Backend, ErrorKind::InvalidRequest]
}

fn default_dalle_url() -> String {
    "https://api.openai.com/v1/images/generations".to_string()
}

fn default_dalle_model() -> String {
    "dall-e-3".to_string()
}

const fn default_timeout() -> u64 {
    30
}

const fn default_poll_max_attempts() -> u32 {
    30
}

const fn default_poll_interval() -> u64 {
    10
}
