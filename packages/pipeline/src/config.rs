//! Run configuration.
//!
//! Layered lowest to highest priority: built-in defaults, an optional TOML
//! file, then explicit overrides. The binary feeds its flags (which fall
//! back to `PHOTO_REGIONS_PRECISION` / `PHOTO_REGIONS_WORKERS`) in as
//! overrides.

use std::num::NonZero;
use std::path::Path;

use photo_regions_bucket::Precision;
use serde::{Deserialize, Serialize};

/// Errors from loading or validating a [`ResolveConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path of the config file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has invalid values.
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Worker count must be at least one.
    #[error("Invalid worker count {0}: must be at least 1")]
    InvalidWorkers(usize),
}

/// Tuning for one resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolveConfig {
    /// Geohash length used for bucketing.
    pub precision: Precision,
    /// Maximum number of buckets resolved concurrently.
    pub workers: usize,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            precision: Precision::DEFAULT,
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZero::get)
}

impl ResolveConfig {
    /// Parses a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Toml`] if the document is invalid
    /// * [`ConfigError::InvalidWorkers`] if `workers` is zero
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise
    /// the errors of [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        log::debug!("Loaded config from {}", path.display());

        Self::from_toml_str(&text)
    }

    /// Overrides the precision.
    #[must_use]
    pub const fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Overrides the worker count.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWorkers`] if `workers` is zero.
    pub const fn with_workers(mut self, workers: usize) -> Result<Self, ConfigError> {
        self.workers = workers;
        self.validate()
    }

    const fn validate(self) -> Result<Self, ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers(0));
        }
        Ok(self)
    }
}
