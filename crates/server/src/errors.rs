use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use models::errors::ModelError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// Error response rendered as `{"error": message}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub message: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self { Self::new(StatusCode::BAD_REQUEST, message) }

    pub fn not_found(message: impl Into<String>) -> Self { Self::new(StatusCode::NOT_FOUND, message) }

    pub fn internal(message: impl Into<String>) -> Self { Self::new(StatusCode::INTERNAL_SERVER_ERROR, message) }

    /// Map a service failure. Storage details are logged, and the client only
    /// sees `failure` (e.g. "error creating todo").
    pub fn from_service(err: ServiceError, failure: &str) -> Self {
        match err {
            ServiceError::Validation(msg) | ServiceError::Model(ModelError::Validation(msg)) => Self::bad_request(msg),
            ServiceError::NotFound(_) => Self::not_found("todo not found"),
            other => {
                error!(err = %other, "{}", failure);
                Self::internal(failure)
            }
        }
    }

    /// Label used for the operations counter.
    pub fn outcome(&self) -> &'static str {
        match self.status {
            StatusCode::BAD_REQUEST => "invalid",
            StatusCode::NOT_FOUND => "not_found",
            _ => "error",
        }
    }
}

impl From<ModelError> for JsonApiError {
    fn from(err: ModelError) -> Self {
        Self::from_service(err.into(), "internal error")
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({"error": self.message}))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database connection failed: {0}")]
    Database(String),
    #[error("schema migration failed: {0}")]
    Migration(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
