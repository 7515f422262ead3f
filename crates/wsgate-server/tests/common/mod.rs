//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use wsgate_server::{AllowAll, RunningServer, Server, ServerConfig, SessionHub};
use wsgate_session::Authorizer;

pub type ClientSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Session handle of the running server.
    pub hub: SessionHub,
    running: Option<RunningServer>,
}

impl TestServer {
    /// Start a test server that admits every session.
    pub async fn start() -> Result<Self> {
        Self::start_with(ServerConfig::new(), AllowAll).await
    }

    /// Start a test server with a custom authorizer.
    pub async fn start_with_authorizer(authorizer: impl Authorizer) -> Result<Self> {
        Self::start_with(ServerConfig::new(), authorizer).await
    }

    /// Start a test server with custom configuration and authorizer.
    ///
    /// The bind address is always replaced with an ephemeral local port.
    pub async fn start_with(config: ServerConfig, authorizer: impl Authorizer) -> Result<Self> {
        let config = config.with_bind_address("127.0.0.1:0".parse()?);
        let running = Server::new(config)
            .with_authorizer(authorizer)
            .start()
            .await?;

        Ok(Self {
            addr: running.local_addr(),
            client: Client::new(),
            hub: running.hub(),
            running: Some(running),
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// WebSocket URL for a session.
    pub fn ws_url(&self, session_id: &str) -> String {
        format!("ws://{}/ws/sessions/{}", self.addr, session_id)
    }

    /// Open a WebSocket for `session_id` and wait until the server has registered it.
    pub async fn connect(&self, session_id: &str) -> Result<ClientSocket> {
        let (socket, _) = connect_async(self.ws_url(session_id)).await?;
        self.wait_for_session(session_id).await?;
        Ok(socket)
    }

    /// Attempt a WebSocket handshake and return the HTTP status it was refused with.
    ///
    /// Fails if the handshake unexpectedly succeeds.
    pub async fn refused_status(&self, session_id: &str) -> Result<u16> {
        match connect_async(self.ws_url(session_id)).await {
            Ok(_) => anyhow::bail!("handshake for {} was accepted", session_id),
            Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
                Ok(response.status().as_u16())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Issue a DELETE for a session.
    pub async fn delete(&self, session_id: &str) -> Result<u16> {
        let resp = self
            .client
            .delete(format!("{}/ws/sessions/{}", self.base_url(), session_id))
            .send()
            .await?;
        Ok(resp.status().as_u16())
    }

    /// Wait until a session is live.
    pub async fn wait_for_session(&self, session_id: &str) -> Result<()> {
        let hub = self.hub.clone();
        let id = session_id.to_string();
        self.wait_until(move || hub.session_exists(&id)).await
    }

    /// Wait until the live session count reaches `count`.
    pub async fn wait_for_count(&self, count: usize) -> Result<()> {
        let hub = self.hub.clone();
        self.wait_until(move || hub.live_session_count() == count)
            .await
    }

    /// Poll `condition` until it holds, for at most five seconds.
    pub async fn wait_until(&self, condition: impl Fn() -> bool) -> Result<()> {
        let result = timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(_) => anyhow::bail!("Timeout waiting for condition"),
        }
    }

    /// Take the running server, leaving `shutdown` a no-op.
    pub fn take_running(&mut self) -> Option<RunningServer> {
        self.running.take()
    }

    /// Shut the server down.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(running) = self.running.take() {
            running.shutdown().await?;
        }
        Ok(())
    }
}
