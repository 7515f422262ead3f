//! Configuration file model.
//!
//! Every section is optional in the file; a missing section means "use the
//! defaults" and a missing key inside a section falls back to that key's
//! default.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;
/// Default handshake timeout in seconds.
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 3;
/// Default WebSocket read buffer size in bytes.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;
/// Default WebSocket write buffer size in bytes.
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 1024;
/// Default maximum inbound message size in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;
/// Default shutdown grace period in seconds.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;
/// Default session lifetime in seconds.
pub const DEFAULT_TTL_SECS: u64 = 60 * 60;
/// Default sweep interval in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 10;

/// Longest accepted session lifetime in seconds (ten years).
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;
/// Longest accepted sweep interval in seconds (one day).
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;
/// Longest accepted handshake timeout in seconds (one hour).
pub const MAX_HANDSHAKE_TIMEOUT_SECS: u64 = 60 * 60;
/// Longest accepted shutdown grace period in seconds (one day).
pub const MAX_SHUTDOWN_GRACE_SECS: u64 = 24 * 60 * 60;

/// Root configuration, as read from `config.toml` / `wsgate.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WsgateConfig {
    /// Listener and upgrade settings.
    pub server: Option<ServerSection>,

    /// Session lifetime settings.
    pub sessions: Option<SessionsSection>,

    /// Authorization settings.
    pub auth: Option<AuthSection>,
}

impl WsgateConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not merged key by key.
    pub fn merge(&mut self, other: WsgateConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }

        if other.sessions.is_some() {
            self.sessions = other.sessions;
        }

        if other.auth.is_some() {
            self.auth = other.auth;
        }
    }

    /// The `[server]` section, or its defaults.
    pub fn server(&self) -> ServerSection {
        self.server.clone().unwrap_or_default()
    }

    /// The `[sessions]` section, or its defaults.
    pub fn sessions(&self) -> SessionsSection {
        self.sessions.clone().unwrap_or_default()
    }

    /// The `[auth]` section, or its defaults.
    pub fn auth(&self) -> AuthSection {
        self.auth.clone().unwrap_or_default()
    }

    /// Check every section for values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.server().validate()?;
        self.sessions().validate()?;
        self.auth().validate()
    }

    /// A fully populated configuration with every default written out.
    ///
    /// Used by `wsgate config init`.
    pub fn example() -> Self {
        Self {
            server: Some(ServerSection::default()),
            sessions: Some(SessionsSection::default()),
            auth: Some(AuthSection::default()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Seconds an admission request may take before it is abandoned.
    pub handshake_timeout_secs: u64,
    /// WebSocket read buffer size in bytes.
    pub read_buffer_size: usize,
    /// WebSocket write buffer size in bytes.
    pub write_buffer_size: usize,
    /// Largest inbound message accepted, in bytes.
    pub max_message_size: usize,
    /// Seconds shutdown waits for in-flight work before forcing close.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            handshake_timeout_secs: DEFAULT_HANDSHAKE_TIMEOUT_SECS,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

impl ServerSection {
    /// Resolve `bind` and `port` into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind.parse().map_err(|_| {
            ConfigError::invalid("server.bind", format!("'{}' is not an IP address", self.bind))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Handshake timeout as a duration.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// Shutdown grace period as a duration.
    pub fn shutdown_grace_period(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        check_secs(
            "server.handshake_timeout_secs",
            self.handshake_timeout_secs,
            1,
            MAX_HANDSHAKE_TIMEOUT_SECS,
        )?;
        check_secs(
            "server.shutdown_grace_secs",
            self.shutdown_grace_secs,
            0,
            MAX_SHUTDOWN_GRACE_SECS,
        )?;
        if self.max_message_size == 0 {
            return Err(ConfigError::invalid(
                "server.max_message_size",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

/// `[sessions]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsSection {
    /// Session lifetime in seconds, measured from admission.
    pub ttl_secs: u64,
    /// Seconds between expiry sweeps.
    pub sweep_interval_secs: u64,
}

impl Default for SessionsSection {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl SessionsSection {
    /// Session lifetime as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Sweep interval as a duration.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        check_secs("sessions.ttl_secs", self.ttl_secs, 1, MAX_TTL_SECS)?;
        check_secs(
            "sessions.sweep_interval_secs",
            self.sweep_interval_secs,
            1,
            MAX_SWEEP_INTERVAL_SECS,
        )
    }
}

fn check_secs(field: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min {
        return Err(ConfigError::invalid(field, format!("must be at least {}", min)));
    }
    if value > max {
        return Err(ConfigError::invalid(field, format!("must be at most {}", max)));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Which built-in authorizer the binary installs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Reject every session.
    #[default]
    DenyAll,
    /// Accept every non-empty session ID.
    AllowAll,
    /// Accept only the IDs listed in `auth.sessions`.
    AllowList,
    /// Accept IDs that parse as UUIDs.
    Uuid,
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuthMode::DenyAll => "deny_all",
            AuthMode::AllowAll => "allow_all",
            AuthMode::AllowList => "allow_list",
            AuthMode::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

/// `[auth]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Authorizer to install.
    pub mode: AuthMode,
    /// Session IDs accepted in `allow_list` mode.
    pub sessions: Vec<String>,
}

impl AuthSection {
    fn validate(&self) -> Result<()> {
        if self.mode == AuthMode::AllowList && self.sessions.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::invalid(
                "auth.sessions",
                "session IDs must not be empty",
            ));
        }
        Ok(())
    }
}
