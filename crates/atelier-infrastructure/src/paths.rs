//! Unified path management for atelier configuration files.
//!
//! All configuration, secrets, and session histories live under one
//! platform-appropriate config directory so every storage component resolves
//! paths the same way.

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for atelier.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/atelier/           # Config directory
/// ├── config.toml              # Engine configuration
/// ├── secret.json              # API keys
/// └── history/                 # One JSON document per user
///     └── <user_id>.json
/// ```
pub struct AtelierPaths;

impl AtelierPaths {
    /// Returns the atelier configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: path to the config directory (e.g. `~/.config/atelier/`)
    /// - `Err(PathError::ConfigDirNotFound)`: could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join("atelier"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Path of the engine configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Path of the secret (API key) file.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    /// Directory holding per-user session histories.
    pub fn history_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("history"))
    }
}
