//! Live session registry with absolute TTL expiry.
//!
//! This crate provides the connection-agnostic core of wsgate:
//! - A [`SessionStore`] mapping session IDs to connection handles
//! - An [`ExpiryIndex`] ordered by expiry time, kept in lockstep with the store
//! - A background [`Sweeper`] that evicts sessions once their TTL has passed
//! - The [`Authorizer`] gate consulted before a session is admitted or removed
//!
//! # Example
//!
//! ```rust,ignore
//! use wsgate_session::{SessionStore, StoreConfig};
//!
//! let config = StoreConfig::default()
//!     .with_ttl(Duration::from_secs(3600))
//!     .with_sweep_interval(Duration::from_secs(10));
//!
//! let store = SessionStore::new(config);
//! store.insert("session-1", connection)?;
//! store.send_to("session-1", "hello").await?;
//! ```

mod config;
mod connection;
mod error;
mod expiry;
mod gate;
mod store;
mod sweeper;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{
    DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL, MAX_SWEEP_INTERVAL, MAX_TTL, StoreConfig,
};
pub use connection::{Connection, ConnectionError, Payload};
pub use error::{Error, Result};
pub use expiry::ExpiryIndex;
pub use gate::{Authorizer, SharedAuthorizer};
pub use store::{SessionInfo, SessionStore, StoreStats};
pub use sweeper::{SWEEP_BATCH_SIZE, Sweeper, SweeperHandle};
