//! Configuration file loading and parsing.
//!
//! This module handles loading the optional configuration file from disk and
//! parsing it into validated, type-safe structures. Environment variables and
//! command-line flags are resolved by the binary and layered on top.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path specified via `--config` CLI flag (must exist)
//! 2. Default location, used only if present:
//!    - **Linux/macOS:** `~/.mcp-demo-client/config.json`
//!    - **Windows:** `%USERPROFILE%\.mcp-demo-client\config.json`
//! 3. Built-in defaults
//!
//! # Server URL Precedence
//!
//! `--server-url` flag, then `MCP_SERVER_URL`, then `server_url` from the file.

mod settings;

pub use settings::{Config, ConnectionSettings, LoggingConfig};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable holding the server URL.
pub const SERVER_URL_ENV: &str = "MCP_SERVER_URL";

/// Environment variable holding the bearer token.
pub const AUTH_TOKEN_ENV: &str = "MCP_AUTH_TOKEN";

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.mcp-demo-client/`
/// - **Windows:** `%USERPROFILE%\.mcp-demo-client\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".mcp-demo-client"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads the configuration.
///
/// An explicit `path` must exist. Without one, the default location is read if
/// a file is there; otherwise built-in defaults are returned.
///
/// # Errors
///
/// Returns an error if:
/// - An explicit configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - Fields are invalid
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };

    if !config_path.exists() {
        return Err(ConfigError::NotFound { path: config_path });
    }

    let contents = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;

    // Validate the configuration
    config.validate()?;

    Ok(config)
}

/// Picks the server URL: the flag/environment value first, then the file.
///
/// Blank values count as unset.
#[must_use]
pub fn resolve_server_url(cli_or_env: Option<String>, config: &Config) -> Option<String> {
    cli_or_env
        .into_iter()
        .chain(config.server_url.clone())
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
}
