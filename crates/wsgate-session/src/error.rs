//! Error types for session store operations.

use crate::connection::ConnectionError;

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No live session exists for the ID.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// A live session already exists for the ID.
    #[error("Session already connected: {0}")]
    Conflict(String),

    /// The store has been closed and admits no more sessions.
    #[error("Session store is closed")]
    Closed,

    /// The session lifetime cannot be represented as an expiry instant.
    #[error("Session TTL {0:?} is out of range")]
    InvalidTtl(std::time::Duration),

    /// The underlying connection failed a write or close.
    #[error("Connection error on session {session_id}: {source}")]
    Connection {
        session_id: String,
        #[source]
        source: ConnectionError,
    },
}

impl Error {
    pub(crate) fn connection(session_id: &str, source: ConnectionError) -> Self {
        Self::Connection {
            session_id: session_id.to_string(),
            source,
        }
    }
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;
