//! HTTP routes.

pub mod health;
pub mod sessions;

use std::time::Duration;

use axum::{Router, routing::get};
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;

pub use health::{HealthResponse, health_routes};
pub use sessions::{
    CLOSE_DUPLICATE_SESSION, CLOSE_GOING_AWAY, SESSION_PATH, SESSION_ROOT_PATH,
    admit_missing_session_handler, admit_session_handler, remove_missing_session_handler,
    remove_session_handler,
};

/// Admission and removal routes.
///
/// `handshake_timeout` bounds how long an admission request may take to be
/// answered, authorization included.
pub fn session_routes(handshake_timeout: Duration) -> Router<AppState> {
    Router::new()
        .route(
            SESSION_PATH,
            get(admit_session_handler).delete(remove_session_handler),
        )
        .route(
            SESSION_ROOT_PATH,
            get(admit_missing_session_handler).delete(remove_missing_session_handler),
        )
        .layer(TimeoutLayer::new(handshake_timeout))
}
