//! Finding and layering config files.
//!
//! Two layers are consulted, lowest precedence first:
//!
//! | Layer   | Path                                                   |
//! |---------|--------------------------------------------------------|
//! | user    | `$WSGATE_CONFIG_DIR/config.toml` or `~/.config/wsgate/config.toml` |
//! | project | `./wsgate.toml`                                        |
//!
//! A layer replaces whole sections of the layers below it. CLI flags are
//! applied on top by the binary. `--config <file>` bypasses discovery.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ConfigError, Result, WsgateConfig};

const PROJECT_FILE: &str = "wsgate.toml";
const USER_FILE: &str = "config.toml";
const CONFIG_DIR_ENV: &str = "WSGATE_CONFIG_DIR";

/// Where a layer comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Per-user config directory.
    User,
    /// Working directory of the project.
    Project,
    /// A file named on the command line.
    Explicit,
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            LayerKind::User => "user",
            LayerKind::Project => "project",
            LayerKind::Explicit => "explicit",
        })
    }
}

/// What happened to a layer during loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerStatus {
    /// Read and merged.
    Applied,
    /// No file at the path.
    Absent,
    /// The file exists but was ignored; carries the reason.
    Skipped(String),
}

/// One candidate config file.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub kind: LayerKind,
    pub path: PathBuf,
    pub status: LayerStatus,
}

impl ConfigLayer {
    /// Whether this layer contributed to the merged config.
    pub fn is_applied(&self) -> bool {
        self.status == LayerStatus::Applied
    }
}

/// Merged configuration plus the layers it was built from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: WsgateConfig,
    /// Every layer consulted, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

impl LoadedConfig {
    /// Load exactly one file. Unlike discovery, an unreadable file is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self {
            config: read_config(path)?,
            layers: vec![ConfigLayer {
                kind: LayerKind::Explicit,
                path: path.to_path_buf(),
                status: LayerStatus::Applied,
            }],
        })
    }

    /// Layers that were merged.
    pub fn applied(&self) -> impl Iterator<Item = &ConfigLayer> {
        self.layers.iter().filter(|l| l.is_applied())
    }

    /// One message per skipped layer.
    pub fn warnings(&self) -> impl Iterator<Item = String> + '_ {
        self.layers.iter().filter_map(|l| match &l.status {
            LayerStatus::Skipped(reason) => {
                Some(format!("ignoring {} config {}: {}", l.kind, l.path.display(), reason))
            }
            _ => None,
        })
    }
}

/// Discover and merge config layers.
///
/// `project_dir` defaults to the working directory.
pub fn discover(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    discover_in(project_dir, user_config_dir().as_deref())
}

/// Like [`discover`] but with the user config directory given explicitly.
pub fn discover_in(project_dir: Option<&Path>, user_dir: Option<&Path>) -> Result<LoadedConfig> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(dir) = user_dir {
        candidates.push((LayerKind::User, dir.join(USER_FILE)));
    }
    let project = match project_dir {
        Some(dir) => dir.join(PROJECT_FILE),
        None => PathBuf::from(PROJECT_FILE),
    };
    candidates.push((LayerKind::Project, project));

    let mut config = WsgateConfig::new();
    let layers = candidates
        .into_iter()
        .map(|(kind, path)| {
            let status = apply_layer(&mut config, &path);
            debug!(layer = %kind, path = %path.display(), status = ?status, "Config layer");
            ConfigLayer { kind, path, status }
        })
        .collect();

    Ok(LoadedConfig { config, layers })
}

/// Parse a single config file.
pub fn read_config(path: &Path) -> Result<WsgateConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    WsgateConfig::from_toml(&contents)
}

/// Write `config` to `path`, creating missing parent directories.
pub fn write_config(config: &WsgateConfig, path: &Path) -> Result<()> {
    let write_err = |p: &Path, e: std::io::Error| ConfigError::WriteFile {
        path: p.display().to_string(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
    }
    std::fs::write(path, config.to_toml()?).map_err(|e| write_err(path, e))
}

/// The per-user config directory.
///
/// `WSGATE_CONFIG_DIR` wins when set and non-empty.
pub fn user_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("wsgate")),
    }
}

/// The per-user config file.
pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(USER_FILE))
}

fn apply_layer(config: &mut WsgateConfig, path: &Path) -> LayerStatus {
    if !path.is_file() {
        return LayerStatus::Absent;
    }
    match read_config(path) {
        Ok(layer) => {
            config.merge(layer);
            LayerStatus::Applied
        }
        Err(e) => LayerStatus::Skipped(e.to_string()),
    }
}
