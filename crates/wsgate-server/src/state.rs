//! Application state shared across handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use wsgate_session::{SessionStore, SharedAuthorizer};

use crate::config::ServerConfig;
use crate::connection::WsConnection;
use crate::hub::SessionHub;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Live sessions and their expiry index.
    pub sessions: SessionStore<WsConnection>,

    /// Authorization gate. `None` denies every session.
    pub authorizer: Option<SharedAuthorizer>,

    /// Cancelled once shutdown begins; no admissions are accepted after that.
    pub draining: CancellationToken,
}

impl AppState {
    /// Create a new application state with no authorizer.
    pub fn new(config: ServerConfig) -> Self {
        let sessions = SessionStore::new(config.store_config());
        Self {
            config: Arc::new(config),
            sessions,
            authorizer: None,
            draining: CancellationToken::new(),
        }
    }

    /// Set the authorization gate.
    pub fn with_authorizer(mut self, authorizer: SharedAuthorizer) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Application-facing session handle.
    pub fn hub(&self) -> SessionHub {
        SessionHub::new(self.sessions.clone())
    }

    /// Whether shutdown has begun.
    pub fn is_draining(&self) -> bool {
        self.draining.is_cancelled()
    }
}
