//! Error types for the deployment tracker

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Main error type for the deployment tracker
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unsupported cloud provider: {0}")]
    UnsupportedProvider(String),

    /// Raised for both unknown ids and ids owned by someone else.
    #[error("Deployment not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Halt signal raised by a store mutation that observed a cancelled record.
    #[error("Deployment cancelled: {0}")]
    Cancelled(String),

    #[error("Sequencer fault: {0}")]
    SequencerFault(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for DeployError {
    fn from(err: anyhow::Error) -> Self {
        DeployError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for DeployError {
    fn from(rejection: JsonRejection) -> Self {
        DeployError::ValidationError(rejection.body_text())
    }
}

impl DeployError {
    /// HTTP status the error is surfaced with
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeployError::ValidationError(_) | DeployError::UnsupportedProvider(_) => {
                StatusCode::BAD_REQUEST
            }
            DeployError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            DeployError::NotFound => StatusCode::NOT_FOUND,
            DeployError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DeployError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
