//! Configuration for memscout
//!
//! Provides defaults, optional TOML file loading, and validation for
//! the few tunables the crate has: the memory walker's chunk size and
//! its retry limit for transiently unreadable chunks.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration-related error type.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration result type.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for [`walk_memory`](crate::memory::walk_memory).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalkSettings {
    /// Size of the chunk handed to the walk callback, in bytes.
    pub buffer_size: usize,
    /// How many times a failed chunk read is retried by re-anchoring
    /// on the nearest readable region before it is recorded as a soft
    /// error.
    pub max_retries: u32,
}

impl Default for WalkSettings {
    fn default() -> Self {
        WalkSettings {
            buffer_size: 4096,
            max_retries: 5,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub walk: WalkSettings,
}

impl Config {
    /// Load configuration from a TOML file. A missing file yields the
    /// defaults; a present but malformed or invalid file is an error.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Config> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.walk.buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "walk.buffer_size must be greater than zero".to_string(),
            ));
        }
        if self.walk.buffer_size > 64 * 1024 * 1024 {
            return Err(ConfigError::Invalid(
                "walk.buffer_size must not exceed 64 MiB".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.walk.buffer_size, 4096);
        assert_eq!(config.walk.max_retries, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let config = Config::load("/nonexistent/memscout.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[walk]\nbuffer_size = 8192\nmax_retries = 2").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.walk.buffer_size, 8192);
        assert_eq!(config.walk.max_retries, 2);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[walk]\nbuffer_size = 0").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[walk]\nchunk = 1").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_oversized_buffer() {
        let config = Config {
            walk: WalkSettings {
                buffer_size: 128 * 1024 * 1024,
                max_retries: 5,
            },
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
