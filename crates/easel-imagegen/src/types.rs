use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ImageGenError, Result};

/// URL of a generated image
pub type ImageUrl = String;

/// Free-form backend parameters
pub type Params = Map<String, Value>;

const DEFAULT_SIZE: &str = "1024x1024";
const DEFAULT_QUALITY: &str = "standard";

/// Provider-agnostic image generation request
///
/// Values are immutable; use [`ImageRequest::with_params`] to derive a
/// modified copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRequest {
    prompt: String,
    size: String,
    quality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    additional_params: Params,
}

impl ImageRequest {
    /// Create a request with default size and quality
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the prompt is empty or whitespace
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        let prompt = prompt.into();

        if prompt.trim().is_empty() {
            return Err(ImageGenError::InvalidRequest("prompt must not be empty".to_string()));
        }

        Ok(Self {
            prompt,
            size: DEFAULT_SIZE.to_string(),
            quality: DEFAULT_QUALITY.to_string(),
            model: None,
            additional_params: Params::new(),
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn quality(&self) -> &str {
        &self.quality
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub const fn additional_params(&self) -> &Params {
        &self.additional_params
    }

    /// Look up a single additional parameter
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.additional_params.get(key)
    }

    /// Copy this request with the given overrides applied
    ///
    /// Scalar fields are replaced when set. Additional parameters are
    /// merged key by key, with the override winning.
    #[must_use]
    pub fn with_params(&self, overrides: RequestOverrides) -> Self {
        let mut additional_params = self.additional_params.clone();
        additional_params.extend(overrides.additional_params);

        Self {
            prompt: self.prompt.clone(),
            size: overrides.size.unwrap_or_else(|| self.size.clone()),
            quality: overrides.quality.unwrap_or_else(|| self.quality.clone()),
            model: overrides.model.or_else(|| self.model.clone()),
            additional_params,
        }
    }
}

/// Field overrides for [`ImageRequest::with_params`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOverrides {
    pub size: Option<String>,
    pub quality: Option<String>,
    pub model: Option<String>,
    pub additional_params: Params,
}

impl RequestOverrides {
    #[must_use]
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    #[must_use]
    pub fn quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional_params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.additional_params.extend(params);
        self
    }
}

/// Timeout and retry budget for one outbound call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    /// Total attempts, including the first
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// One fully-described outbound POST
///
/// Produced by an adapter and consumed by the executor. The payload is
/// complete before the first attempt.
#[derive(Clone)]
pub struct RequestConfig {
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub payload: Value,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl RequestConfig {
    pub fn new(url: impl Into<String>, headers: IndexMap<String, String>, payload: Value, policy: CallPolicy) -> Self {
        Self {
            url: url.into(),
            headers,
            payload,
            timeout: policy.timeout,
            max_retries: policy.max_retries,
            retry_delay: policy.retry_delay,
        }
    }
}

// Header values carry credentials, so only names are printed
impl std::fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestConfig")
            .field("url", &self.url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("payload", &self.payload)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}
