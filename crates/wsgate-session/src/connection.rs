//! Connection handle abstraction.
//!
//! The store never performs I/O itself; it only hands out handles. The
//! [`Connection`] trait is the capability surface a transport must provide
//! so that the embedding application can reach a client by session ID.

use async_trait::async_trait;

/// A message payload sent to or received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
}

impl Payload {
    /// Raw bytes of the payload.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Binary(data) => data,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Check if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Payload::Binary(data)
    }
}

impl From<&[u8]> for Payload {
    fn from(data: &[u8]) -> Self {
        Payload::Binary(data.to_vec())
    }
}

/// Error raised by a connection handle.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectionError {
    /// The connection has already been closed.
    #[error("Connection closed")]
    Closed,

    /// The transport reported a failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Duplex connection capability held by the session store.
///
/// Implementations must be safe to call from many tasks at once. Writes and
/// reads may be serialized internally.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Write one message to the client.
    async fn send(&self, payload: Payload) -> Result<(), ConnectionError>;

    /// Read the next data message from the client.
    ///
    /// Returns `Ok(None)` once the client has closed the stream.
    async fn read_message(&self) -> Result<Option<Payload>, ConnectionError>;

    /// Perform a protocol-level close handshake.
    async fn close(&self, code: u16, reason: &str) -> Result<(), ConnectionError>;
}
