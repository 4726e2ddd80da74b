//! Configuration management for roomwarden
//!
//! Environment-based configuration with defaults, TOML file loading and
//! validation. Environment variables follow the pattern
//! `ROOMWARDEN_<SECTION>_<KEY>`; durations given through the environment
//! are in milliseconds, matching the platform-side convention.

use crate::model::ChannelId;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Room lifecycle configuration
    pub rooms: RoomsConfig,

    /// Durable store configuration
    pub store: StoreConfig,

    /// Activity ledger configuration
    pub ledger: LedgerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Room lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomsConfig {
    /// The hub location whose occupancy triggers room creation
    pub hub_location: ChannelId,

    /// How long a room may sit empty before reclamation
    #[serde(with = "humantime_serde")]
    pub grace_period: Duration,

    /// Cadence of the reclamation sweeper
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

/// Durable store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the trust and registry documents
    pub data_dir: PathBuf,
}

/// Activity ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Directory receiving the daily log stream files
    pub log_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            hub_location: ChannelId::new(""),
            grace_period: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Example: `ROOMWARDEN_ROOMS_HUB_LOCATION=123456789`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(hub) = env::var("ROOMWARDEN_ROOMS_HUB_LOCATION") {
            config.rooms.hub_location = ChannelId::new(hub);
        }
        if let Ok(millis) = env::var("ROOMWARDEN_ROOMS_GRACE_PERIOD_MS") {
            let millis: u64 = millis.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid grace period: {}", e))
            })?;
            config.rooms.grace_period = Duration::from_millis(millis);
        }
        if let Ok(millis) = env::var("ROOMWARDEN_ROOMS_SWEEP_INTERVAL_MS") {
            let millis: u64 = millis.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid sweep interval: {}", e))
            })?;
            config.rooms.sweep_interval = Duration::from_millis(millis);
        }

        if let Ok(data_dir) = env::var("ROOMWARDEN_STORE_DATA_DIR") {
            config.store.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(log_dir) = env::var("ROOMWARDEN_LEDGER_LOG_DIR") {
            config.ledger.log_dir = PathBuf::from(log_dir);
        }

        if let Ok(level) = env::var("ROOMWARDEN_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = env::var("ROOMWARDEN_LOG_JSON") {
            config.logging.json_format = json
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid JSON flag: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rooms.hub_location.as_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "hub_location must be set".to_string(),
            ));
        }

        if self.rooms.sweep_interval.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "sweep_interval must be greater than 0".to_string(),
            ));
        }

        if self.rooms.grace_period.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "grace_period must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}
