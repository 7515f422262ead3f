//! Session store: registry of live connections plus their expiry index.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, trace};

use crate::config::{MAX_TTL, StoreConfig};
use crate::connection::{Connection, Payload};
use crate::error::{Error, Result};
use crate::expiry::ExpiryIndex;

/// WebSocket close code for a normal closure.
const CLOSE_NORMAL: u16 = 1000;

/// Entry stored in the registry.
struct SessionEntry<C> {
    /// Connection handle, owned by the store.
    connection: Arc<C>,

    /// Wall-clock admission time, for reporting.
    admitted_at: DateTime<Utc>,
}

/// Registry and expiry index, always mutated together.
struct StoreInner<C> {
    /// Live sessions by ID.
    sessions: HashMap<String, SessionEntry<C>>,

    /// Expiry ordering for the same set of IDs.
    expiry: ExpiryIndex,

    /// Set by [`SessionStore::close`]; no insert succeeds afterwards.
    closed: bool,
}

impl<C> StoreInner<C> {
    fn remove_pair(&mut self, session_id: &str) -> Option<Arc<C>> {
        self.expiry.remove(session_id);
        self.sessions.remove(session_id).map(|e| e.connection)
    }
}

/// Snapshot of a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Session ID.
    pub id: String,

    /// When the session was admitted.
    pub admitted_at: DateTime<Utc>,

    /// When the session becomes eligible for eviction.
    pub expires_at: Instant,
}

/// Store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of live sessions in the registry.
    pub live: usize,

    /// Number of entries in the expiry index.
    pub indexed: usize,
}

impl StoreStats {
    /// Whether the registry and the expiry index agree.
    pub fn is_consistent(&self) -> bool {
        self.live == self.indexed
    }
}

/// Concurrent registry of live sessions with absolute TTL expiry.
///
/// The store is the single owner of both the session map and the expiry
/// index. Every mutation updates the two under one write lock, so a session
/// ID is in one structure exactly when it is in the other. Lookups take the
/// read lock and return a cloned handle; no I/O happens while a lock is held.
///
/// Cloning the store is cheap and yields another handle to the same state.
pub struct SessionStore<C> {
    inner: Arc<RwLock<StoreInner<C>>>,
    config: StoreConfig,
}

impl<C: Connection> SessionStore<C> {
    /// Create an empty store.
    pub fn new(config: StoreConfig) -> Self {
        let inner = StoreInner {
            sessions: HashMap::new(),
            expiry: ExpiryIndex::new(),
            closed: false,
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
            config,
        }
    }

    /// Get the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Expiry instant for a session admitted at `now`.
    ///
    /// TTLs above [`MAX_TTL`] are clamped.
    fn expiry_from(&self, now: Instant) -> Result<Instant> {
        now.checked_add(self.config.ttl.min(MAX_TTL))
            .ok_or(Error::InvalidTtl(self.config.ttl))
    }

    /// Admit a session.
    ///
    /// The session expires `ttl` after this call. Fails with
    /// [`Error::Conflict`] if the ID is already live; the existing entry is
    /// left untouched. Fails with [`Error::Closed`] once the store is closed.
    pub fn insert(&self, session_id: &str, connection: impl Into<Arc<C>>) -> Result<Instant> {
        let mut inner = self.inner.write();

        if inner.closed {
            return Err(Error::Closed);
        }
        if inner.sessions.contains_key(session_id) {
            return Err(Error::Conflict(session_id.to_string()));
        }

        let expires_at = self.expiry_from(Instant::now())?;
        inner.expiry.insert(session_id, expires_at);
        inner.sessions.insert(
            session_id.to_string(),
            SessionEntry {
                connection: connection.into(),
                admitted_at: Utc::now(),
            },
        );

        trace!(
            session_id = %session_id,
            live = inner.sessions.len(),
            "Session inserted into store"
        );

        Ok(expires_at)
    }

    /// Admit a session, displacing any live session with the same ID.
    ///
    /// For reconnect-replaces-session semantics. The new session gets a fresh
    /// expiry. The displaced handle is returned unclosed.
    pub fn replace(
        &self,
        session_id: &str,
        connection: impl Into<Arc<C>>,
    ) -> Result<Option<Arc<C>>> {
        let mut inner = self.inner.write();

        if inner.closed {
            return Err(Error::Closed);
        }

        let expires_at = self.expiry_from(Instant::now())?;
        let displaced = inner.remove_pair(session_id);
        inner.expiry.insert(session_id, expires_at);
        inner.sessions.insert(
            session_id.to_string(),
            SessionEntry {
                connection: connection.into(),
                admitted_at: Utc::now(),
            },
        );

        if displaced.is_some() {
            debug!(session_id = %session_id, "Session replaced by reconnect");
        }

        Ok(displaced)
    }

    /// Remove a session. Does not close its connection.
    ///
    /// Returns the handle if the session was live.
    pub fn remove(&self, session_id: &str) -> Option<Arc<C>> {
        let removed = self.inner.write().remove_pair(session_id);
        if removed.is_some() {
            trace!(session_id = %session_id, "Session removed from store");
        }
        removed
    }

    /// Check if a session is live.
    pub fn exists(&self, session_id: &str) -> bool {
        self.inner.read().sessions.contains_key(session_id)
    }

    /// Get the connection handle for a live session.
    pub fn get(&self, session_id: &str) -> Option<Arc<C>> {
        self.inner
            .read()
            .sessions
            .get(session_id)
            .map(|e| Arc::clone(&e.connection))
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.inner.read().sessions.len()
    }

    /// Check if no session is live.
    pub fn is_empty(&self) -> bool {
        self.inner.read().sessions.is_empty()
    }

    /// Expiry time of a live session.
    pub fn expires_at(&self, session_id: &str) -> Option<Instant> {
        self.inner.read().expiry.expires_at(session_id)
    }

    /// Snapshot of a live session.
    pub fn info(&self, session_id: &str) -> Option<SessionInfo> {
        let inner = self.inner.read();
        let entry = inner.sessions.get(session_id)?;
        let expires_at = inner.expiry.expires_at(session_id)?;
        Some(SessionInfo {
            id: session_id.to_string(),
            admitted_at: entry.admitted_at,
            expires_at,
        })
    }

    /// IDs of all live sessions, in no particular order.
    pub fn session_ids(&self) -> Vec<String> {
        self.inner.read().sessions.keys().cloned().collect()
    }

    /// Remove up to `limit` sessions whose expiry is at or before `now`.
    ///
    /// Returns the evicted IDs, soonest expiry first. Connections are dropped,
    /// not closed.
    pub fn evict_expired(&self, now: Instant, limit: usize) -> Vec<String> {
        let (expired, evicted) = {
            let mut inner = self.inner.write();
            let expired = inner.expiry.drain_expired(now, limit);
            let evicted: Vec<_> = expired
                .iter()
                .filter_map(|id| inner.sessions.remove(id))
                .collect();
            (expired, evicted)
        };
        // Sockets are released after the lock
        drop(evicted);
        expired
    }

    /// Remove every session. Returns how many were live.
    pub fn clear(&self) -> usize {
        self.drain_all(false)
    }

    /// Remove every session and refuse all later inserts.
    ///
    /// Returns how many were live. Closing twice is harmless.
    pub fn close(&self) -> usize {
        self.drain_all(true)
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.read().closed
    }

    fn drain_all(&self, close: bool) -> usize {
        let drained = {
            let mut inner = self.inner.write();
            inner.closed |= close;
            inner.expiry.clear();
            std::mem::take(&mut inner.sessions)
        };
        let count = drained.len();
        // Sockets are released after the lock
        drop(drained);

        if count > 0 {
            info!(count, closed = close, "Cleared all sessions");
        }
        count
    }

    /// Get store statistics.
    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read();
        StoreStats {
            live: inner.sessions.len(),
            indexed: inner.expiry.len(),
        }
    }

    /// Write a message to a live session.
    ///
    /// Fails with [`Error::NotFound`] if the session is not live, or
    /// [`Error::Connection`] if the write fails.
    pub async fn send_to(&self, session_id: &str, payload: impl Into<Payload>) -> Result<()> {
        let connection = self
            .get(session_id)
            .ok_or_else(|| Error::NotFound(session_id.to_string()))?;

        let payload = payload.into();
        trace!(session_id = %session_id, bytes = payload.len(), "Sending to session");

        connection
            .send(payload)
            .await
            .map_err(|e| Error::connection(session_id, e))
    }

    /// Gracefully close a live session's connection.
    ///
    /// The session stays in the store until it is removed or expires.
    pub async fn close_session(&self, session_id: &str) -> Result<()> {
        let connection = self
            .get(session_id)
            .ok_or_else(|| Error::NotFound(session_id.to_string()))?;

        debug!(session_id = %session_id, "Closing session connection");

        connection
            .close(CLOSE_NORMAL, "")
            .await
            .map_err(|e| Error::connection(session_id, e))
    }
}

impl<C> Clone for SessionStore<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            config: self.config.clone(),
        }
    }
}
