//! Application Configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `DEMAND__`-prefixed environment variables
//! (e.g. `DEMAND__MODEL__MANIFEST_PATH=/models/energy.json`).

use crate::rate_limit::RateLimitConfig;
use config::{Config, ConfigError, Environment, File};
use data_validator::ValidationConfig;
use inference_engine::BandThresholds;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;

/// Config file looked up when no explicit path is given
const DEFAULT_CONFIG_FILE: &str = "config/default";

/// Prefix of overriding environment variables
const ENV_PREFIX: &str = "DEMAND";

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Model artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path of the model manifest (JSON)
    pub manifest_path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from("models/energy_model.json"),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Max level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Parsed max level
    pub fn max_level(&self) -> Result<Level, ConfigError> {
        self.level.parse::<Level>().map_err(|_| {
            ConfigError::Message(format!(
                "logging.level {:?} is not one of trace, debug, info, warn, error",
                self.level
            ))
        })
    }
}

/// Metrics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and expose `/metrics`
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Top-level configuration, constructed once at start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub bands: BandThresholds,
    pub validation: ValidationConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Load configuration. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(path: Option<&str>, env: Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(env.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Reject settings that cannot work together
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bands.high_mw <= self.bands.moderate_mw {
            return Err(ConfigError::Message(format!(
                "bands.high_mw ({}) must be greater than bands.moderate_mw ({})",
                self.bands.high_mw, self.bands.moderate_mw
            )));
        }
        self.logging.max_level()?;
        Ok(())
    }
}
