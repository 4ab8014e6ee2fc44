//! Error types for the HTTP layer

use hyper::StatusCode;
use latsight_core::domain::DomainError;
use thiserror::Error;

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body failed validation
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// The request body exceeded the configured limit
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The request body could not be read from the connection
    #[error("failed to read request body: {0}")]
    BodyRead(String),

    /// No route matches the path
    #[error("Not Found")]
    NotFound,

    /// The path exists but not for this method
    #[error("Method Not Allowed")]
    MethodNotAllowed { allow: &'static str },

    /// Unexpected server-side failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body sent to the client: `{"detail": "..."}`.
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "detail": self.to_string() })
    }
}
