//! WebSocket session server for wsgate.
//!
//! This crate puts an HTTP front on the [`wsgate_session`] registry:
//!
//! - `GET /ws/sessions/{id}` authorizes a session and upgrades it to a WebSocket
//! - `DELETE /ws/sessions/{id}` drops a session from the registry
//! - `GET /health` reports liveness and the live session count
//!
//! The embedding application reaches clients through a [`SessionHub`].
//!
//! # Example
//!
//! ```ignore
//! use wsgate_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::new()
//!     .with_bind_address("127.0.0.1:8080".parse()?);
//!
//! let running = Server::new(config)
//!     .with_authorizer(|id: &str| id.starts_with("client-"))
//!     .start()
//!     .await?;
//!
//! running.hub().send_to("client-1", "hello").await?;
//! running.shutdown().await?;
//! ```

pub mod auth;
pub mod config;
pub mod connection;
pub mod error;
pub mod hub;
pub mod routes;
pub mod state;

pub use auth::{AllowAll, AllowList, DenyAll, UuidSessions, authorize_session};
pub use config::ServerConfig;
pub use connection::{ConnectionId, WsConnection};
pub use error::{ErrorResponse, Result, ServerError};
pub use hub::SessionHub;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use wsgate_session::{Authorizer, SharedAuthorizer, Sweeper, SweeperHandle};

/// The wsgate HTTP/WebSocket server, before it is started.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server. Until an authorizer is set, every session is denied.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Set the authorization gate.
    pub fn with_authorizer(self, authorizer: impl Authorizer) -> Self {
        self.with_shared_authorizer(Arc::new(authorizer))
    }

    /// Set an already shared authorization gate.
    pub fn with_shared_authorizer(mut self, authorizer: SharedAuthorizer) -> Self {
        self.state = self.state.with_authorizer(authorizer);
        self
    }

    /// Application-facing session handle.
    pub fn hub(&self) -> SessionHub {
        self.state.hub()
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::health_routes())
            .merge(routes::session_routes(self.state.config().handshake_timeout))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind the listener, start serving and start the sweeper.
    ///
    /// When this returns the listener is bound and both background tasks are
    /// running, so clients can connect immediately.
    pub async fn start(self) -> Result<RunningServer> {
        let addr = self.state.config().bind_address;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Failed to read local address: {}", e)))?;

        let sweeper = Sweeper::new(self.state.sessions.clone()).spawn(CancellationToken::new());

        let shutdown = CancellationToken::new();
        let router = self.router();
        let signal = shutdown.clone().cancelled_owned();
        let serve = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(signal)
                .await
        });

        info!(
            addr = %local_addr,
            ttl = ?self.state.config().session_ttl,
            sweep_interval = ?self.state.config().sweep_interval,
            "wsgate server listening"
        );

        Ok(RunningServer {
            local_addr,
            state: self.state,
            shutdown,
            serve,
            sweeper,
        })
    }
}

/// A started server.
pub struct RunningServer {
    local_addr: SocketAddr,
    state: AppState,
    shutdown: CancellationToken,
    serve: JoinHandle<std::io::Result<()>>,
    sweeper: SweeperHandle,
}

impl RunningServer {
    /// Address the server is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Application-facing session handle.
    pub fn hub(&self) -> SessionHub {
        self.state.hub()
    }

    /// Wait for `signal`, then shut down.
    pub async fn run_until(self, signal: impl Future<Output = ()>) -> Result<()> {
        signal.await;
        self.shutdown().await
    }

    /// Stop the server.
    ///
    /// New admissions are refused at once and the sweeper finishes its
    /// current pass and stops. In-flight requests get `shutdown_grace_period`
    /// to finish; past that the server task is aborted and
    /// [`ServerError::Timeout`] is returned. Either way the store is then
    /// closed: every session is dropped and a socket whose upgrade completes
    /// later is refused.
    pub async fn shutdown(self) -> Result<()> {
        let grace = self.state.config().shutdown_grace_period;
        let deadline = tokio::time::Instant::now().checked_add(grace);

        info!(addr = %self.local_addr, "Shutting down wsgate server");

        self.state.draining.cancel();
        self.shutdown.cancel();

        if within(deadline, self.sweeper.shutdown()).await.is_none() {
            warn!("Sweeper did not stop within the grace period");
        }

        let mut serve = self.serve;
        let result = match within(deadline, &mut serve).await {
            Some(Ok(Ok(()))) => Ok(()),
            Some(Ok(Err(e))) => Err(ServerError::Internal(format!("Server error: {}", e))),
            Some(Err(e)) => Err(ServerError::Internal(format!("Server task failed: {}", e))),
            None => {
                serve.abort();
                error!(grace = ?grace, "Graceful shutdown timed out, forcing close");
                Err(ServerError::Timeout(grace))
            }
        };

        let released = self.state.sessions.close();
        info!(released, "wsgate server stopped");

        result
    }
}

/// Await `fut` until `deadline`. `None` deadline means no limit.
async fn within<F: Future>(deadline: Option<tokio::time::Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_server_health_endpoint() {
        let server = Server::new(ServerConfig::default());
        let app = server.router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let config = ServerConfig::new().with_bind_address("127.0.0.1:0".parse().unwrap());
        let running = Server::new(config).with_authorizer(AllowAll).start().await.unwrap();

        assert_ne!(running.local_addr().port(), 0);
        assert_eq!(running.hub().live_session_count(), 0);

        running.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_store() {
        let config = ServerConfig::new().with_bind_address("127.0.0.1:0".parse().unwrap());
        let server = Server::new(config).with_authorizer(AllowAll);
        let state = server.state.clone();
        let running = server.start().await.unwrap();

        running.shutdown().await.unwrap();

        assert!(state.is_draining());
        assert!(state.sessions.is_closed());
    }

    #[tokio::test]
    async fn test_unbounded_grace_period_does_not_panic() {
        let config = ServerConfig::new()
            .with_bind_address("127.0.0.1:0".parse().unwrap())
            .with_shutdown_grace_period(std::time::Duration::from_secs(u64::MAX));
        let running = Server::new(config).start().await.unwrap();

        running.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let taken = listener.local_addr().unwrap();

        let result = Server::new(ServerConfig::new().with_bind_address(taken))
            .start()
            .await;
        assert!(matches!(result, Err(ServerError::Internal(_))));
    }
}
