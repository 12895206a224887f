//! Core configuration types and loading.

use herald_core::PermLevel;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::{
    default_bot_name, default_console_author, default_console_level, default_log_level,
    default_max_concurrency, default_prefix,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration. Every section is optional; an empty file is valid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Bot identity and command prefix.
    #[serde(default)]
    pub bot: BotConfig,
    /// Event fanout worker pool.
    #[serde(default)]
    pub fanout: FanoutConfig,
    /// Log level and format.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Cooldown registry maintenance.
    #[serde(default)]
    pub cooldowns: CooldownConfig,
    /// Console harness identity.
    #[serde(default)]
    pub console: ConsoleConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Command prefix (default: "%%").
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Display name of the bot account.
    #[serde(default = "default_bot_name")]
    pub name: String,
    /// Top-level commands disabled for everyone (matched case-insensitively).
    #[serde(default)]
    pub disabled_commands: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            name: default_bot_name(),
            disabled_commands: Vec::new(),
        }
    }
}

impl BotConfig {
    pub fn is_disabled(&self, command: &str) -> bool {
        self.disabled_commands
            .iter()
            .any(|c| c.eq_ignore_ascii_case(command))
    }
}

/// Event fanout worker pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FanoutConfig {
    /// Listener invocations allowed to run at once (default: 64).
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Per-listener timeout in seconds. Unset means no timeout.
    pub listener_timeout_secs: Option<u64>,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            listener_timeout_secs: None,
        }
    }
}

impl FanoutConfig {
    /// Pool settings for the fanout manager.
    pub fn pool(&self) -> herald_core::FanoutConfig {
        herald_core::FanoutConfig {
            max_concurrency: self.max_concurrency,
            listener_timeout: self.listener_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Logging configuration. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (default: "info").
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Cooldown maintenance configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CooldownConfig {
    /// Seconds between sweeps of expired cooldown entries. Unset disables
    /// the sweep.
    pub purge_interval_secs: Option<u64>,
}

/// Who the console harness speaks as.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Author name for console input (default: "operator").
    #[serde(default = "default_console_author")]
    pub author: String,
    /// Permission level granted to console input (default: owner).
    #[serde(default = "default_console_level")]
    pub level: PermLevel,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            author: default_console_author(),
            level: default_console_level(),
        }
    }
}
