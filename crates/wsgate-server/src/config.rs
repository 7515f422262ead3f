//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use wsgate_session::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL, StoreConfig};

/// Default address to listen on.
pub const DEFAULT_BIND_ADDRESS: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);

/// Default time allowed to answer an admission request (3 seconds).
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(3);

/// Default WebSocket read buffer size in bytes.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Default WebSocket write buffer size in bytes.
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 1024;

/// Default max inbound message size for WebSocket (1 MB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Default grace period for shutdown (5 seconds).
pub const DEFAULT_SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Server configuration. Fixed once the server starts.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Lifetime of an admitted session.
    pub session_ttl: Duration,

    /// Interval between expiry sweeps.
    pub sweep_interval: Duration,

    /// Time allowed to answer an admission request, authorization included.
    pub handshake_timeout: Duration,

    /// WebSocket read buffer size in bytes.
    pub read_buffer_size: usize,

    /// WebSocket write buffer size in bytes.
    pub write_buffer_size: usize,

    /// Maximum inbound WebSocket message size in bytes.
    pub max_message_size: usize,

    /// How long shutdown waits for in-flight requests before forcing close.
    pub shutdown_grace_period: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS,
            session_ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            shutdown_grace_period: DEFAULT_SHUTDOWN_GRACE_PERIOD,
        }
    }
}

impl ServerConfig {
    /// Create a new server config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the session lifetime.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the admission handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the WebSocket read and write buffer sizes.
    pub fn with_buffer_sizes(mut self, read: usize, write: usize) -> Self {
        self.read_buffer_size = read;
        self.write_buffer_size = write;
        self
    }

    /// Set the maximum inbound WebSocket message size.
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the shutdown grace period.
    pub fn with_shutdown_grace_period(mut self, period: Duration) -> Self {
        self.shutdown_grace_period = period;
        self
    }

    /// Session store settings derived from this config.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new()
            .with_ttl(self.session_ttl)
            .with_sweep_interval(self.sweep_interval)
    }
}
