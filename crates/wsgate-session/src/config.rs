//! Configuration for the session store.

use std::time::Duration;

/// Default lifetime of an admitted session (1 hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Default interval between expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Longest session lifetime the store honours (10 years). Larger values are
/// clamped.
pub const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Longest sweep interval the sweeper honours (1 day). Larger values are
/// clamped.
pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for the session store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Lifetime of a session, measured from admission.
    /// Activity on the connection does not extend it.
    pub ttl: Duration,

    /// How often the sweeper checks for expired sessions.
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(3600));
        assert_eq!(config.sweep_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new()
            .with_ttl(Duration::from_millis(500))
            .with_sweep_interval(Duration::from_millis(50));
        assert_eq!(config.ttl, Duration::from_millis(500));
        assert_eq!(config.sweep_interval, Duration::from_millis(50));
    }
}
