use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use easel_imagegen::ImageGenError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced synchronously by the HTTP layer
#[derive(Debug, Error)]
pub enum ServerError {
    /// Unknown task id
    #[error("Task not found")]
    TaskNotFound,

    /// Body could not be parsed
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Request rejected before generation started
    #[error(transparent)]
    ImageGen(#[from] ImageGenError),
}

impl ServerError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::TaskNotFound => StatusCode::NOT_FOUND,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::ImageGen(e) => StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Get the error type string for the response
    pub fn error_type(&self) -> &str {
        match self {
            Self::TaskNotFound => "not_found_error",
            Self::InvalidBody(_) => "invalid_request_error",
            Self::ImageGen(e) => match e {
                ImageGenError::InvalidRequest(_) | ImageGenError::ProviderNotFound(_) => "invalid_request_error",
                ImageGenError::ConfigError(_) => "internal_error",
                _ => "api_error",
            },
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    message: String,
    r#type: String,
    code: u16,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_response = ErrorResponse {
            error: ErrorDetails {
                message: self.to_string(),
                r#type: self.error_type().to_string(),
                code: status.as_u16(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}
