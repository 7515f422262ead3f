//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Authorization denied or session ID missing.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A live session already holds this ID.
    #[error("Conflict: session {0} is already connected")]
    Conflict(String),

    /// No live session for this ID.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The WebSocket handshake could not be completed.
    #[error("Upgrade failed: {0}")]
    UpgradeFailed(String),

    /// The server is shutting down and accepts no new sessions.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Writing to or closing a session's connection failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Graceful shutdown exceeded its grace period and was forced.
    #[error("Shutdown timed out after {0:?}; forced close")]
    Timeout(std::time::Duration),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<wsgate_session::Error> for ServerError {
    fn from(e: wsgate_session::Error) -> Self {
        match e {
            wsgate_session::Error::NotFound(id) => ServerError::NotFound(id),
            wsgate_session::Error::Conflict(id) => ServerError::Conflict(id),
            wsgate_session::Error::Closed => {
                ServerError::ServiceUnavailable("server is shutting down".to_string())
            }
            e @ wsgate_session::Error::InvalidTtl(_) => ServerError::Internal(e.to_string()),
            e @ wsgate_session::Error::Connection { .. } => ServerError::Connection(e.to_string()),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ServerError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ServerError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServerError::UpgradeFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "upgrade_failed")
            }
            ServerError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
            }
            ServerError::Connection(_) => (StatusCode::BAD_GATEWAY, "connection_error"),
            ServerError::Timeout(_) => (StatusCode::INTERNAL_SERVER_ERROR, "timeout"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, code, error = %message, "Server error");
        } else {
            tracing::warn!(status = %status, code, error = %message, "Client error");
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
