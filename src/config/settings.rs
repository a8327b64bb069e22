//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Scryfall API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "api.base_url must be an http(s) URL, got '{}'",
                    self.api.base_url
                ),
            });
        }

        if self.api.user_agent.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "api.user_agent cannot be empty; Scryfall requires an identifying User-Agent".to_string(),
            });
        }

        // More than 10s between requests would make the tools unusable;
        // treat it as a typo (ms vs s confusion).
        if self.api.min_delay_ms > 10_000 {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "api.min_delay_ms of {} is implausibly large (limit: 10000)",
                    self.api.min_delay_ms
                ),
            });
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "api.timeout_secs cannot be zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Scryfall API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the Scryfall REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Minimum spacing between outbound requests, in milliseconds.
    /// Default: 120 (~8-9 rps; Scryfall asks for under 10 rps).
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Outbound request timeout, in seconds. Default: 30.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Minimum inter-request spacing as a [`Duration`].
    #[must_use]
    pub const fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            min_delay_ms: default_min_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.scryfall.com".to_string()
}

fn default_user_agent() -> String {
    format!(
        "scryfall-mcp/{} (+{})",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_REPOSITORY")
    )
}

const fn default_min_delay_ms() -> u64 {
    120
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.api.base_url, "https://api.scryfall.com");
        assert_eq!(config.api.min_delay_ms, 120);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_api_config() {
        let json = r#"{
            "api": {
                "min_delay_ms": 200
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.api.min_delay_ms, 200);
        assert_eq!(config.api.base_url, "https://api.scryfall.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reject_non_http_base_url() {
        let json = r#"{
            "api": {
                "base_url": "ftp://api.scryfall.com"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_empty_user_agent() {
        let json = r#"{
            "api": {
                "user_agent": "  "
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_implausible_delay() {
        let json = r#"{
            "api": {
                "min_delay_ms": 120000
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_zero_timeout() {
        let json = r#"{
            "api": {
                "timeout_secs": 0
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
