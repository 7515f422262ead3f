//! Configuration system for wsgate.
//!
//! Provides TOML-based configuration with:
//! - `[server]` listener, upgrade buffers and shutdown grace period
//! - `[sessions]` session TTL and sweep interval
//! - `[auth]` choice of built-in authorizer
//! - Config file layering (XDG user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigLayer, LayerKind, LayerStatus, LoadedConfig, discover, discover_in, read_config,
    user_config_dir, user_config_path, write_config,
};
pub use error::{ConfigError, Result};
pub use types::*;
