//! Configuration loading for pagecast-station.
//!
//! Configuration is loaded from a TOML file (default: `station.toml`).
//! Every section and field is optional.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use pagecast_types::DEFAULT_PORT;

/// Root configuration for pagecast-station.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// On-air scheduling configuration.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// TCP bind address (default: 0.0.0.0:1234).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// On-air scheduling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Tick period in milliseconds (default: 1000).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Whether pages are put on air at startup (default: true).
    #[serde(default = "default_rendering")]
    pub rendering: bool,
}

// Default value functions
fn default_bind_address() -> String {
    format!("0.0.0.0:{DEFAULT_PORT}")
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_rendering() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            rendering: default_rendering(),
        }
    }
}

impl ScheduleConfig {
    /// Tick period; a zero setting is raised to one millisecond.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Replace the port of the bind address.
    pub fn with_port(mut self, port: u16) -> Result<Self, ConfigError> {
        let mut addr = self.bind_addr()?;
        addr.set_port(port);
        self.server.bind_address = addr.to_string();
        Ok(self)
    }

    /// Parsed bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind_address
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(self.server.bind_address.clone()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Bind address is not `ip:port`.
    #[error("invalid bind address: {0}")]
    InvalidBindAddress(String),
}
