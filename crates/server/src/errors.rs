use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// JSON error body returned by every subscription endpoint.
#[derive(Debug, Serialize)]
pub struct JsonApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: Option<String>) -> Self {
        Self { status, error: error.into(), message }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", Some(message.into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let msg = e.to_string();
        if e.is_client_error() {
            let error = match e {
                ServiceError::Validation(_) => "Validation Error",
                _ => "Invalid Date Range",
            };
            return Self::new(StatusCode::BAD_REQUEST, error, Some(msg));
        }
        match e {
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Not Found", Some(msg)),
            ServiceError::Timeout(_) => {
                error!(err = %msg, "store deadline exceeded");
                Self::new(StatusCode::GATEWAY_TIMEOUT, "Timeout", Some(msg))
            }
            _ => {
                error!(err = %msg, "store failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", Some(msg))
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error("migration failed: {0}")]
    Migration(String),
}
