//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::collections::HashMap;
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

    /// MCP server endpoint, used when neither the flag nor the environment set one.
    #[serde(default)]
    pub server_url: Option<String>,

    /// Connection settings.
    #[serde(default)]
    pub connection: ConnectionSettings,

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
        if let Some(ref url) = self.server_url {
            if url.trim().is_empty() {
                return Err(ConfigError::ValidationError {
                    message: "server_url must not be empty".to_string(),
                });
            }
        }

        if self.connection.timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "connection.timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.connection.headers.keys().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::ValidationError {
                message: "connection.headers must not contain an empty header name".to_string(),
            });
        }

        let names: Vec<String> = self
            .connection
            .headers
            .keys()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        if names.iter().enumerate().any(|(i, name)| names[..i].contains(name)) {
            return Err(ConfigError::ValidationError {
                message: "connection.headers must not repeat a header name".to_string(),
            });
        }

        Ok(())
    }
}

/// How to reach the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSettings {
    /// Timeout in seconds for connecting and for each request.
    /// Default: 30
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional connection attempts after a timed-out or refused one.
    /// Default: 3
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Extra headers for the WebSocket upgrade request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ConnectionSettings {
    /// The timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            headers: HashMap::new(),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_retry_attempts() -> u32 {
    3
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
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
