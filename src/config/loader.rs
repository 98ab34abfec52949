//! Configuration loading from file system
//!
//! Handles loading and parsing ~/.quicklaunch/config.json.

use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use super::types::Config;
use crate::error::{LauncherError, Result};

/// Default config location (~/.quicklaunch/config.json)
pub fn default_config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.quicklaunch/config.json").as_ref())
}

/// Load configuration from ~/.quicklaunch/config.json
///
/// Returns Config::default() if the file is missing or unreadable.
pub fn load_config() -> Config {
    load_config_from(&default_config_path())
}

/// Load configuration from an explicit path
///
/// A missing file, an unreadable file and invalid JSON all fall back to
/// defaults with a warning; configuration problems are never fatal.
#[instrument(name = "load_config")]
pub fn load_config_from(config_path: &Path) -> Config {
    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        return Config::default();
    }

    match read_config(config_path) {
        Ok(mut config) => {
            let fixed = config.validate();
            info!(
                path = %config_path.display(),
                fixed_fields = fixed,
                "Successfully loaded config"
            );
            config
        }
        Err(error) => {
            warn!(
                path = %config_path.display(),
                error = %error,
                severity = ?error.severity(),
                "Using default config"
            );
            Config::default()
        }
    }
}

/// Read and parse a config file without validation or fallback
pub(crate) fn read_config(config_path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(config_path).map_err(|e| {
        LauncherError::Config(format!("cannot read {}: {}", config_path.display(), e))
    })?;
    serde_json::from_str::<Config>(&content).map_err(|e| {
        LauncherError::Config(format!(
            "invalid JSON in {} at line {}, column {}: {}",
            config_path.display(),
            e.line(),
            e.column(),
            e
        ))
    })
}
