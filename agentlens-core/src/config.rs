//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/agentlens/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/agentlens/` (~/.config/agentlens/)
//! - State/Logs: `$XDG_STATE_HOME/agentlens/` (~/.local/state/agentlens/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Runtime API endpoint configuration
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Debug-stream configuration
    #[serde(default)]
    pub streams: StreamConfig,

    /// Memory statistics configuration
    #[serde(default)]
    pub stats: StatsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Runtime API endpoint configuration
#[derive(Debug, Deserialize, Clone)]
pub struct EndpointConfig {
    /// Base URL of the agent runtime API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EndpointConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("endpoint.base_url must not be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "endpoint.base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "endpoint.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:7700".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Debug-stream configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StreamConfig {
    /// Server log lines pulled by a manual stream refresh
    #[serde(default = "default_log_window")]
    pub log_window: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            log_window: default_log_window(),
        }
    }
}

fn default_log_window() -> usize {
    200
}

/// Memory statistics configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    /// Milliseconds to wait after subsystem activity settles before
    /// refetching stats
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl StatsConfig {
    /// Debounce delay as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    5_000
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.endpoint.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/agentlens/config.toml` (~/.config/agentlens/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("agentlens").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/agentlens/` (~/.local/state/agentlens/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("agentlens")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/agentlens/agentlens.log` (~/.local/state/agentlens/agentlens.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("agentlens.log")
    }
}
