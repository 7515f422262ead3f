//! Session admission and removal endpoints.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::StatusCode,
    response::Response,
};
use tracing::{debug, error, info, warn};
use wsgate_session::Connection;

use crate::auth::authorize_session;
use crate::connection::WsConnection;
use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Route for a single session.
pub const SESSION_PATH: &str = "/ws/sessions/{id}";

/// Route hit when the session ID segment is empty.
pub const SESSION_ROOT_PATH: &str = "/ws/sessions/";

/// Close code sent to a socket that lost a concurrent admission race.
pub const CLOSE_DUPLICATE_SESSION: u16 = 4009;

/// Close code sent to a socket upgraded after shutdown began.
pub const CLOSE_GOING_AWAY: u16 = 1001;

/// Close code sent when a socket cannot be registered for another reason.
const CLOSE_INTERNAL_ERROR: u16 = 1011;

type Upgrade = std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>;

// ─────────────────────────────────────────────────────────────────────────────
// Admission
// ─────────────────────────────────────────────────────────────────────────────

/// GET /ws/sessions/{id} - Authorize and upgrade a session.
pub async fn admit_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ws: Upgrade,
) -> Result<Response> {
    admit(state, session_id, ws).await
}

/// GET /ws/sessions/ - Admission without a session ID is always refused.
pub async fn admit_missing_session_handler(
    State(state): State<AppState>,
    ws: Upgrade,
) -> Result<Response> {
    admit(state, String::new(), ws).await
}

/// Run the admission checks in order and, if they pass, upgrade.
///
/// Nothing is inserted unless the upgrade completes.
async fn admit(state: AppState, session_id: String, ws: Upgrade) -> Result<Response> {
    if state.is_draining() {
        return Err(ServerError::ServiceUnavailable(
            "server is shutting down".to_string(),
        ));
    }

    if session_id.is_empty() {
        return Err(ServerError::Unauthorized("missing session id".to_string()));
    }

    if !authorize_session(state.authorizer.as_ref(), &session_id).await {
        return Err(ServerError::Unauthorized(format!(
            "session {} is not authorized",
            session_id
        )));
    }

    if state.sessions.exists(&session_id) {
        return Err(ServerError::Conflict(session_id));
    }

    let ws = ws.map_err(|e| ServerError::UpgradeFailed(e.to_string()))?;

    let config = state.config();
    let ws = ws
        .read_buffer_size(config.read_buffer_size)
        .write_buffer_size(config.write_buffer_size)
        .max_message_size(config.max_message_size);

    let failed_id = session_id.clone();
    let response = ws
        .on_failed_upgrade(move |e| {
            warn!(session_id = %failed_id, error = %e, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| register_session(state, session_id, socket));

    Ok(response)
}

/// Insert an upgraded socket into the store.
///
/// A socket whose upgrade finishes after shutdown began is closed and never
/// stored.
async fn register_session(state: AppState, session_id: String, socket: WebSocket) {
    let connection = Arc::new(WsConnection::new(socket));

    let refused = if state.is_draining() {
        Err(wsgate_session::Error::Closed)
    } else {
        state.sessions.insert(&session_id, Arc::clone(&connection))
    };

    let (code, reason) = match refused {
        Ok(_) => {
            info!(
                session_id = %session_id,
                connection_id = %connection.id(),
                live = state.sessions.len(),
                "Session admitted"
            );
            return;
        }
        Err(wsgate_session::Error::Closed) => {
            debug!(session_id = %session_id, "Upgrade finished during shutdown, closing socket");
            (CLOSE_GOING_AWAY, "server shutting down")
        }
        Err(wsgate_session::Error::Conflict(_)) => {
            debug!(session_id = %session_id, "Admission lost race, closing socket");
            (CLOSE_DUPLICATE_SESSION, "session already connected")
        }
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to register session");
            (CLOSE_INTERNAL_ERROR, "internal error")
        }
    };

    if let Err(e) = connection.close(code, reason).await {
        debug!(session_id = %session_id, error = %e, "Failed to close refused socket");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Removal
// ─────────────────────────────────────────────────────────────────────────────

/// DELETE /ws/sessions/{id} - Drop a session from the registry.
///
/// Always answers 204, whether or not the session was live or authorized.
/// The connection itself is not closed.
pub async fn remove_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> StatusCode {
    remove(&state, &session_id).await;
    StatusCode::NO_CONTENT
}

/// DELETE /ws/sessions/ - No session ID, nothing to remove.
pub async fn remove_missing_session_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn remove(state: &AppState, session_id: &str) {
    if session_id.is_empty() {
        return;
    }

    if !authorize_session(state.authorizer.as_ref(), session_id).await {
        warn!(session_id = %session_id, "Removal not authorized, ignoring");
        return;
    }

    if state.sessions.remove(session_id).is_some() {
        info!(session_id = %session_id, live = state.sessions.len(), "Session removed");
    } else {
        debug!(session_id = %session_id, "Removal for unknown session");
    }
}
