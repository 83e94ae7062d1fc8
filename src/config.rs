//! Declarative logger configuration
//!
//! A [`LoggerConfig`] can be deserialised from JSON or assembled from
//! environment variables and turned into a [`Logger`] with its writers.

use crate::core::{LogLevel, LogSource, Logger, LoggerError, Metadata, Result};
use crate::writers::{ConsoleConfig, ConsoleWriter, FileConfig, FileWriter, NetworkConfig};
use serde::{Deserialize, Serialize};

/// Environment variable holding the minimum level
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
/// Environment variable enabling the file writer
pub const ENV_LOG_FILE: &str = "LOG_FILE";
/// Environment variable enabling the network writer
pub const ENV_LOG_ENDPOINT: &str = "LOG_ENDPOINT";

/// Logger settings; absent fields take their defaults
///
/// # Example
///
/// ```
/// use structured_logger::{LoggerConfig, LogLevel};
///
/// let config = LoggerConfig::from_json_str(r#"{
///     "source": "auth",
///     "min_level": "warn",
///     "default_metadata": { "service": "identity" },
///     "console": { "use_colors": false }
/// }"#).unwrap();
///
/// assert_eq!(config.min_level, LogLevel::Warn);
/// let logger = config.build().unwrap();
/// assert_eq!(logger.writers().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub source: LogSource,
    pub min_level: LogLevel,
    pub default_metadata: Metadata,
    pub console: Option<ConsoleConfig>,
    pub file: Option<FileConfig>,
    pub network: Option<NetworkConfig>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            source: LogSource::default(),
            min_level: LogLevel::Debug,
            default_metadata: Metadata::new(),
            console: Some(ConsoleConfig::default()),
            file: None,
            network: None,
        }
    }
}

impl LoggerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LoggerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `LOG_LEVEL`, `LOG_FILE` and `LOG_ENDPOINT`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LoggerConfig::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.min_level = level
                .parse()
                .map_err(|e: String| LoggerError::config(ENV_LOG_LEVEL, e))?;
        }
        if let Some(path) = lookup(ENV_LOG_FILE).filter(|p| !p.trim().is_empty()) {
            config.file = Some(FileConfig::new(path));
        }
        if let Some(endpoint) = lookup(ENV_LOG_ENDPOINT).filter(|e| !e.trim().is_empty()) {
            config.network = Some(NetworkConfig::new(endpoint));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(ref file) = self.file {
            file.validate()?;
        }
        if let Some(ref network) = self.network {
            network.validate()?;
        }
        Ok(())
    }

    /// Build a logger with console, file and network writers, in that order
    pub fn build(&self) -> Result<Logger> {
        self.validate()?;

        let mut builder = Logger::builder()
            .source(self.source)
            .min_level(self.min_level)
            .default_metadata(self.default_metadata.clone());

        if let Some(ref console) = self.console {
            builder = builder.writer(ConsoleWriter::with_config(console.clone()));
        }
        if let Some(ref file) = self.file {
            builder = builder.writer(FileWriter::new(file.clone())?);
        }
        if let Some(ref network) = self.network {
            builder = builder.writer(network_writer(network)?);
        }

        Ok(builder.build())
    }
}

#[cfg(feature = "network")]
fn network_writer(config: &NetworkConfig) -> Result<crate::writers::NetworkWriter> {
    crate::writers::NetworkWriter::new(config.clone())
}

#[cfg(not(feature = "network"))]
fn network_writer(_config: &NetworkConfig) -> Result<crate::writers::NoopWriter> {
    Err(LoggerError::config(
        "LoggerConfig",
        "network writer requires the `network` feature",
    ))
}
