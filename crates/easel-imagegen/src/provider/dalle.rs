use async_trait::async_trait;
use easel_config::ProviderKind;
use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

use super::{ImageProvider, RequestAdapter, submit};
use crate::{
    error::{ImageGenError, Result},
    http::HttpExecutor,
    types::{CallPolicy, ImageRequest, ImageUrl, RequestConfig},
};

/// `OpenAI` DALL-E image generation provider
pub struct DalleProvider {
    executor: HttpExecutor,
    api_url: String,
    api_key: SecretString,
    default_model: String,
    policy: CallPolicy,
}

impl DalleProvider {
    /// Create a new DALL-E provider
    ///
    /// `api_url` is the full generation endpoint, not a base URL.
    pub fn new(api_url: impl Into<String>, api_key: SecretString, default_model: impl Into<String>, policy: CallPolicy) -> Self {
        Self {
            executor: HttpExecutor::new(),
            api_url: api_url.into(),
            api_key,
            default_model: default_model.into(),
            policy,
        }
    }

    #[must_use]
    pub fn with_executor(mut self, executor: HttpExecutor) -> Self {
        self.executor = executor;
        self
    }
}

/// Wire format for the DALL-E generation request
#[derive(Serialize)]
struct DalleImageRequest<'a> {
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    model: &'a str,
    n: u32,
}

impl RequestAdapter for DalleProvider {
    fn create_request(&self, request: &ImageRequest) -> Result<RequestConfig> {
        let wire_request = DalleImageRequest {
            prompt: request.prompt(),
            size: request.size(),
            quality: request.quality(),
            model: request.model().unwrap_or(&self.default_model),
            n: 1,
        };

        let payload = serde_json::to_value(&wire_request)
            .map_err(|e| ImageGenError::InvalidRequest(format!("unserializable request: {e}")))?;

        let mut headers = IndexMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key.expose_secret()),
        );
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Ok(RequestConfig::new(self.api_url.clone(), headers, payload, self.policy))
    }

    fn transform_response(&self, response: &Value) -> Result<Option<String>> {
        let url = response
            .pointer("/data/0/url")
            .and_then(Value::as_str)
            .map(str::to_string);

        if url.is_none() {
            tracing::warn!("DALL-E response carried no image url");
        }

        Ok(url)
    }
}

#[async_trait]
impl ImageProvider for DalleProvider {
    async fn generate(&self, request: &ImageRequest) -> Result<Option<ImageUrl>> {
        tracing::debug!(
            model = request.model().unwrap_or(&self.default_model),
            size = request.size(),
            "sending DALL-E generation request"
        );

        submit(self, &self.executor, request).await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Dalle
    }
}
