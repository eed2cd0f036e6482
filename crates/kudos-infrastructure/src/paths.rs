//! Path management for Kudos files.
//!
//! ```text
//! ~/.config/kudos/
//! ├── engine.toml      # EngineConfig
//! └── profiles.toml    # ProfileStoreDocument
//! ```
//!
//! `KUDOS_HOME`, when set, replaces `~/.config/kudos/`.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// No platform config directory and no `KUDOS_HOME`.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find a configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for kudos_core::KudosError {
    fn from(e: PathError) -> Self {
        kudos_core::KudosError::config(e.to_string())
    }
}

pub struct KudosPaths;

impl KudosPaths {
    pub const ENV_HOME: &'static str = "KUDOS_HOME";

    /// Root directory for every Kudos file.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        if let Some(home) = std::env::var_os(Self::ENV_HOME) {
            return Ok(PathBuf::from(home));
        }
        dirs::config_dir()
            .map(|dir| dir.join("kudos"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn engine_config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("engine.toml"))
    }

    pub fn profiles_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("profiles.toml"))
    }
}
