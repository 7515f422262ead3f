//! Session authorization.
//!
//! The gate is fail-closed: a missing authorizer, a `false` answer, or an
//! authorizer that panics all deny the session.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;
use wsgate_session::{Authorizer, SharedAuthorizer};

// ─────────────────────────────────────────────────────────────────────────────
// Gate
// ─────────────────────────────────────────────────────────────────────────────

/// Ask the authorizer about a session ID.
///
/// The authorizer runs on the blocking pool since it may do slow or blocking
/// work. Empty IDs are denied without consulting it.
pub async fn authorize_session(gate: Option<&SharedAuthorizer>, session_id: &str) -> bool {
    if session_id.is_empty() {
        return false;
    }

    let Some(gate) = gate else {
        tracing::warn!(session_id = %session_id, "No authorizer configured, denying session");
        return false;
    };

    let gate = Arc::clone(gate);
    let id = session_id.to_string();

    match tokio::task::spawn_blocking(move || gate.authorize(&id)).await {
        Ok(allowed) => allowed,
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Authorizer failed, denying session");
            false
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Built-in authorizers
// ─────────────────────────────────────────────────────────────────────────────

/// Denies every session.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl Authorizer for DenyAll {
    fn authorize(&self, _session_id: &str) -> bool {
        false
    }
}

/// Allows every session. Development use only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _session_id: &str) -> bool {
        true
    }
}

/// Allows only the listed session IDs.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    sessions: HashSet<String>,
}

impl AllowList {
    /// Create an allow list from session IDs.
    pub fn new<I, S>(sessions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sessions: sessions.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of allowed IDs.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if no IDs are allowed.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Authorizer for AllowList {
    fn authorize(&self, session_id: &str) -> bool {
        self.sessions.contains(session_id)
    }
}

/// Allows session IDs that are well-formed UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidSessions;

impl Authorizer for UuidSessions {
    fn authorize(&self, session_id: &str) -> bool {
        Uuid::parse_str(session_id).is_ok()
    }
}
