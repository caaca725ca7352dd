//! Error types for karaoke-queue
//!
//! Validation errors are raised before any mutation. Store failures roll
//! back the in-flight transaction and surface as-is; retrying is the
//! caller's decision.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use karaoke_common::db::{RequestStatus, SongId};
use serde_json::json;
use thiserror::Error;

/// Main error type for the queue service
#[derive(Error, Debug)]
pub enum QueueError {
    /// Event or request id does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Song id could not be resolved against the catalog
    #[error("Invalid song reference: {0}")]
    InvalidReference(SongId),

    /// Status change violates the request lifecycle
    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    /// Import row or request body missing required fields
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Caller lacks the role required for the action
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Persistence layer failed; the operation was rolled back
    #[error("Store failure: {0}")]
    TransientStoreFailure(#[from] sqlx::Error),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<karaoke_common::Error> for QueueError {
    fn from(err: karaoke_common::Error) -> Self {
        use karaoke_common::Error;
        match err {
            Error::Database(e) => QueueError::TransientStoreFailure(e),
            Error::Io(e) => QueueError::Io(e),
            Error::Config(msg) => QueueError::Config(msg),
            Error::NotFound(msg) => QueueError::NotFound(msg),
            Error::InvalidInput(msg) => QueueError::MalformedInput(msg),
            Error::Internal(msg) => QueueError::Internal(msg),
        }
    }
}

impl QueueError {
    /// Stable machine-readable code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            QueueError::NotFound(_) => "NOT_FOUND",
            QueueError::InvalidReference(_) => "INVALID_REFERENCE",
            QueueError::InvalidTransition { .. } => "INVALID_TRANSITION",
            QueueError::MalformedInput(_) => "MALFORMED_INPUT",
            QueueError::Forbidden(_) => "FORBIDDEN",
            QueueError::TransientStoreFailure(_) => "STORE_UNAVAILABLE",
            QueueError::Config(_) => "CONFIG_ERROR",
            QueueError::Io(_) => "IO_ERROR",
            QueueError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            QueueError::NotFound(_) => StatusCode::NOT_FOUND,
            QueueError::InvalidReference(_) => StatusCode::UNPROCESSABLE_ENTITY,
            QueueError::InvalidTransition { .. } => StatusCode::CONFLICT,
            QueueError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            QueueError::Forbidden(_) => StatusCode::FORBIDDEN,
            QueueError::TransientStoreFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            QueueError::Config(_) | QueueError::Io(_) | QueueError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for QueueError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Convenience Result type using QueueError
pub type Result<T> = std::result::Result<T, QueueError>;
