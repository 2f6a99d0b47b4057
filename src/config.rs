//! Process configuration.
//!
//! Read once from the environment at startup, never consulted again.
//! `ALLOWED_PATHS` is mandatory because this extension registers
//! filesystem tools; the other variables only tune logging and timeouts.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct ExtensionConfig {
    /// Server name shown to MCP clients.
    pub name: String,
    /// Server version shown to MCP clients.
    pub version: String,
    /// Directory roots filesystem tools may touch.
    pub allowed_paths: Vec<PathBuf>,
    /// Raises the default log level from warn to info.
    pub logging_enabled: bool,
    /// Optional wall-clock bound per tool call. None means no timeout.
    pub tool_timeout: Option<Duration>,
}

impl ExtensionConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let allowed_paths = parse_allowed_paths(std::env::var("ALLOWED_PATHS").ok().as_deref())?;

        let logging_enabled = std::env::var("ENABLE_LOGGING")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let tool_timeout = parse_timeout(std::env::var("TOOL_TIMEOUT_MS").ok().as_deref())?;

        Ok(Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            allowed_paths,
            logging_enabled,
            tool_timeout,
        })
    }
}

/// Parse the comma-separated `ALLOWED_PATHS` value. Entries are trimmed
/// and empty entries skipped; an absent or effectively empty value is a
/// fatal startup condition.
fn parse_allowed_paths(raw: Option<&str>) -> Result<Vec<PathBuf>, ConfigError> {
    let raw = raw.ok_or(ConfigError::MissingAllowedPaths)?;

    let paths: Vec<PathBuf> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect();

    if paths.is_empty() {
        return Err(ConfigError::MissingAllowedPaths);
    }
    Ok(paths)
}

/// Parse the optional `TOOL_TIMEOUT_MS` value. Unset means no timeout;
/// a non-numeric value is a fatal startup condition.
fn parse_timeout(raw: Option<&str>) -> Result<Option<Duration>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(raw) => {
            let ms: u64 = raw.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: "TOOL_TIMEOUT_MS",
                value: raw.to_string(),
            })?;
            Ok(Some(Duration::from_millis(ms)))
        }
    }
}
