#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod builder;
mod error;
mod http;
pub mod provider;
mod router;
mod types;

use std::sync::Arc;

pub use builder::ImageRouterBuilder;
pub use easel_config::{ErrorKind, ProviderKind};
pub use error::{ImageGenError, Result};
pub use http::{HttpExecutor, http_client};
pub use provider::{DalleProvider, ImageProvider, MidjourneyProvider, RequestAdapter};
pub use router::{ImageRouter, RouterConfig};
pub use types::{CallPolicy, ImageRequest, ImageUrl, Params, RequestConfig, RequestOverrides};

/// Build the image router from configuration
///
/// # Errors
///
/// Returns an error if any configured provider fails to initialize
pub fn build_router(config: &easel_config::Config) -> anyhow::Result<Arc<ImageRouter>> {
    let router = Arc::new(
        ImageRouterBuilder::new(&config.imagegen)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize image router: {e}"))?,
    );
    Ok(router)
}
