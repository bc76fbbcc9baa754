//! Path management for portal configuration files.
//!
//! ```text
//! ~/.config/portal/        # Config directory (platform config dir)
//! └── secret.json          # Record store key and chat webhook settings
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
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

pub struct PortalPaths;

impl PortalPaths {
    const APP_DIR: &'static str = "portal";
    const SECRET_FILE: &'static str = "secret.json";

    /// Returns the portal configuration directory (e.g., `~/.config/portal/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(Self::APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to `secret.json`.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(Self::SECRET_FILE))
    }
}
