//! Test doubles for code that depends on [`Connection`].

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::connection::{Connection, ConnectionError, Payload};

/// In-memory connection that records what was written to it.
#[derive(Debug, Default)]
pub struct MockConnection {
    sent: Mutex<Vec<Payload>>,
    inbound: Mutex<VecDeque<Payload>>,
    closed: Mutex<Option<(u16, String)>>,
    fail_writes: bool,
}

impl MockConnection {
    /// Create a connection that accepts every write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a connection whose writes always fail.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Queue a message for `read_message` to return.
    pub fn push_inbound(&self, payload: impl Into<Payload>) {
        self.inbound.lock().push_back(payload.into());
    }

    /// Everything written so far.
    pub fn sent(&self) -> Vec<Payload> {
        self.sent.lock().clone()
    }

    /// Close code and reason, if the connection was closed.
    pub fn close_frame(&self) -> Option<(u16, String)> {
        self.closed.lock().clone()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn send(&self, payload: Payload) -> Result<(), ConnectionError> {
        if self.fail_writes {
            return Err(ConnectionError::Transport("broken pipe".to_string()));
        }
        if self.closed.lock().is_some() {
            return Err(ConnectionError::Closed);
        }
        self.sent.lock().push(payload);
        Ok(())
    }

    async fn read_message(&self) -> Result<Option<Payload>, ConnectionError> {
        Ok(self.inbound.lock().pop_front())
    }

    async fn close(&self, code: u16, reason: &str) -> Result<(), ConnectionError> {
        if self.fail_writes {
            return Err(ConnectionError::Transport("broken pipe".to_string()));
        }
        let mut closed = self.closed.lock();
        if closed.is_some() {
            return Err(ConnectionError::Closed);
        }
        *closed = Some((code, reason.to_string()));
        Ok(())
    }
}
