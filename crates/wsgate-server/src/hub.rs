//! Application-facing access to live sessions.

use std::sync::Arc;
use std::time::Instant;

use wsgate_session::{Payload, SessionInfo, SessionStore};

use crate::connection::WsConnection;
use crate::error::Result;

/// Handle the embedding application uses to reach clients by session ID.
///
/// Cheap to clone; every clone sees the same sessions.
#[derive(Clone)]
pub struct SessionHub {
    sessions: SessionStore<WsConnection>,
}

impl SessionHub {
    pub(crate) fn new(sessions: SessionStore<WsConnection>) -> Self {
        Self { sessions }
    }

    /// Check if a session is live.
    pub fn session_exists(&self, session_id: &str) -> bool {
        self.sessions.exists(session_id)
    }

    /// Connection handle of a live session.
    pub fn get_connection(&self, session_id: &str) -> Option<Arc<WsConnection>> {
        self.sessions.get(session_id)
    }

    /// Number of live sessions.
    pub fn live_session_count(&self) -> usize {
        self.sessions.len()
    }

    /// IDs of all live sessions.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.session_ids()
    }

    /// When a live session expires.
    pub fn expires_at(&self, session_id: &str) -> Option<Instant> {
        self.sessions.expires_at(session_id)
    }

    /// Snapshot of a live session.
    pub fn session_info(&self, session_id: &str) -> Option<SessionInfo> {
        self.sessions.info(session_id)
    }

    /// Write a message to a session.
    pub async fn send_to(&self, session_id: &str, payload: impl Into<Payload>) -> Result<()> {
        Ok(self.sessions.send_to(session_id, payload).await?)
    }

    /// Gracefully close a session's connection without removing the session.
    pub async fn close_session(&self, session_id: &str) -> Result<()> {
        Ok(self.sessions.close_session(session_id).await?)
    }
}
