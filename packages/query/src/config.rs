//! Search configuration.
//!
//! Defaults live in `config/default.toml` and are embedded at compile time.
//! A user file only needs the keys it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thai_address_fuzzy::FuzzyOptions;
use thiserror::Error;

/// Embedded default configuration.
const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Errors from loading or validating a [`SearchConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for this schema.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Threshold outside `0.0..=1.0`.
    #[error("Invalid threshold {0}: expected a value between 0.0 and 1.0")]
    InvalidThreshold(f64),

    /// Minimum match length of zero.
    #[error("Invalid min_match_char_length: must be at least 1")]
    InvalidMinMatchLength,
}

/// Settings for one search session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Fuzzy index tuning shared by the field searches and the re-rank.
    pub fuzzy: FuzzyOptions,
    /// Maximum number of addresses returned, if any.
    pub limit: Option<usize>,
}

impl SearchConfig {
    /// Returns the embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a compile-time guarantee
    /// since the file ships with the crate).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded search config: {e}"))
    }

    /// Parses and validates a TOML document. Missing keys take their
    /// default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or a value is out of
    /// range.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Loading search config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Checks that every value is within its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreshold`] or
    /// [`ConfigError::InvalidMinMatchLength`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.fuzzy.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        if self.fuzzy.min_match_char_length == 0 {
            return Err(ConfigError::InvalidMinMatchLength);
        }
        Ok(())
    }
}
