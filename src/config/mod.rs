//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path specified via `--config` CLI flag (must exist)
//! 2. Default location:
//!    - **Linux/macOS:** `~/.scryfall-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.scryfall-mcp\config.json`
//!
//! The server runs fine without a config file: when nothing exists at the
//! default location, built-in defaults are used.

mod settings;

pub use settings::{ApiConfig, Config, LoggingConfig};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.scryfall-mcp/`
/// - **Windows:** `%USERPROFILE%\.scryfall-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".scryfall-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses the configuration file.
///
/// If `path` is `None` and nothing exists at the default location,
/// defaults are returned. An explicitly given path must exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly specified file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - Validation fails
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound {
                    path: p.to_path_buf(),
                });
            }
            p.to_path_buf()
        }
        None => {
            let Some(default) = default_config_path() else {
                return Ok(Config::default());
            };
            if !default.exists() {
                return Ok(Config::default());
            }
            default
        }
    };

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;

    config.validate()?;

    Ok(config)
}
