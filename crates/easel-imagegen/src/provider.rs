pub mod dalle;
pub mod midjourney;

use async_trait::async_trait;
use easel_config::ProviderKind;
use serde_json::Value;

use crate::{
    error::Result,
    http::HttpExecutor,
    types::{ImageRequest, ImageUrl, RequestConfig},
};

pub use dalle::DalleProvider;
pub use midjourney::MidjourneyProvider;

/// Trait for image generation provider implementations
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate an image for the given request
    ///
    /// `Ok(None)` means the backend answered but produced no image.
    async fn generate(&self, request: &ImageRequest) -> Result<Option<ImageUrl>>;

    /// Get the provider kind
    fn kind(&self) -> ProviderKind;
}

/// Translation between the generic request model and one backend's wire format
pub trait RequestAdapter {
    /// Build the outbound call for a request
    fn create_request(&self, request: &ImageRequest) -> Result<RequestConfig>;

    /// Extract the image URL or task id from a backend response
    fn transform_response(&self, response: &Value) -> Result<Option<String>>;
}

/// Run one adapter round trip: build, execute, transform
pub(crate) async fn submit<A>(adapter: &A, executor: &HttpExecutor, request: &ImageRequest) -> Result<Option<String>>
where
    A: RequestAdapter + Sync,
{
    let config = adapter.create_request(request)?;
    let response = executor.execute(&config).await?;

    adapter.transform_response(&response)
}
