//! WebSocket-backed connection handle.

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use uuid::Uuid;

use wsgate_session::{Connection, ConnectionError, Payload};

/// Unique identifier for a WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Create a new unique connection ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An upgraded WebSocket held by the session store.
///
/// The socket is split so that a writer and a reader never wait on each
/// other; concurrent writers are serialized on the sink.
pub struct WsConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WebSocket, Message>>,
    stream: Mutex<SplitStream<WebSocket>>,
}

impl WsConnection {
    /// Wrap an upgraded socket.
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self {
            id: ConnectionId::new(),
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }

    /// Identifier of this physical connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    async fn write(&self, message: Message) -> Result<(), ConnectionError> {
        self.sink
            .lock()
            .await
            .send(message)
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))
    }
}

impl std::fmt::Debug for WsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsConnection").field("id", &self.id).finish()
    }
}

#[async_trait::async_trait]
impl Connection for WsConnection {
    async fn send(&self, payload: Payload) -> Result<(), ConnectionError> {
        let message = match payload {
            Payload::Text(text) => Message::Text(Utf8Bytes::from(text)),
            Payload::Binary(data) => Message::Binary(data.into()),
        };
        self.write(message).await
    }

    async fn read_message(&self) -> Result<Option<Payload>, ConnectionError> {
        let mut stream = self.stream.lock().await;

        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Payload::Text(text.as_str().to_owned())));
                }
                Some(Ok(Message::Binary(data))) => return Ok(Some(Payload::Binary(data.to_vec()))),
                // Control frames are answered by the protocol layer
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Err(e)) => return Err(ConnectionError::Transport(e.to_string())),
            }
        }
    }

    async fn close(&self, code: u16, reason: &str) -> Result<(), ConnectionError> {
        tracing::debug!(connection_id = %self.id, code, "Sending close frame");
        self.write(Message::Close(Some(CloseFrame {
            code,
            reason: Utf8Bytes::from(reason.to_string()),
        })))
        .await
    }
}
