use easel_config::ErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Image generation errors
///
/// Every variant carries an HTTP-style status code, mirroring how the
/// backends report failures. Internal conditions reuse the same scale
/// (503 for no capacity, 408 for a poll timeout).
#[derive(Debug, Clone, Error)]
pub enum ImageGenError {
    /// Connection refused, DNS failure, request timeout or unreadable body
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-200 status or reported a failure in the body
    #[error("API Error ({status}): {message}")]
    Api { status: u16, message: String },

    /// No backend resource can accept new work
    #[error("{0}")]
    NoCapacity(String),

    /// Task polling exhausted its attempt budget
    #[error("{0}")]
    PollTimeout(String),

    /// Caller supplied unusable input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider key is unknown or has no registered adapter
    #[error("Unsupported provider: {0}")]
    ProviderNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ImageGenError {
    /// Status code carried by this error
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Network(_) | Self::ConfigError(_) => 500,
            Self::Api { status, .. } => *status,
            Self::NoCapacity(_) => 503,
            Self::PollTimeout(_) => 408,
            Self::InvalidRequest(_) | Self::ProviderNotFound(_) => 400,
        }
    }

    /// Error class used by the router's fallback policy
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Api { .. } => ErrorKind::Backend,
            Self::NoCapacity(_) => ErrorKind::Capacity,
            Self::PollTimeout(_) => ErrorKind::Timeout,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::ProviderNotFound(_) => ErrorKind::ProviderNotFound,
            Self::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// Message without the status prefix
    ///
    /// For backend errors this is the raw response body or the in-body
    /// failure description.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ImageGenError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}
