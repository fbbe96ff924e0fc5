// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry configuration
//!
//! ```toml
//! root_path = "/locks"
//! name = "orders"
//! acquire_timeout = "5s"
//! lock_timeout = "30s"
//! fair = true
//! ```

use crate::path::{PathError, RegistryName, RegistryPath};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("invalid config: {0}")]
    Path(#[from] PathError),
}

/// Configuration for a lock registry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Base path on the coordination service
    pub root_path: String,
    /// Registry name, appended to the root path
    pub name: RegistryName,
    /// Upper bound on each distributed acquire attempt
    #[serde(default = "default_acquire_timeout", with = "humantime_serde")]
    pub acquire_timeout: Duration,
    /// Upper bound on the local wait when locking through `synchronized`
    #[serde(default, with = "humantime_serde")]
    pub lock_timeout: Option<Duration>,
    /// Hand the local lock to waiters in arrival order
    #[serde(default = "default_fair")]
    pub fair: bool,
}

fn default_acquire_timeout() -> Duration {
    DEFAULT_ACQUIRE_TIMEOUT
}

fn default_fair() -> bool {
    true
}

impl RegistryConfig {
    pub fn new(root_path: impl Into<String>, name: RegistryName) -> Self {
        Self {
            root_path: root_path.into(),
            name,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            lock_timeout: None,
            fair: true,
        }
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    pub fn with_fairness(mut self, fair: bool) -> Self {
        self.fair = fair;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.registry_path()?;
        if self.acquire_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "acquire_timeout must be positive".to_string(),
            ));
        }
        if self.lock_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::Invalid(
                "lock_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory under which this registry's mutexes live
    pub fn registry_path(&self) -> Result<RegistryPath, ConfigError> {
        Ok(RegistryPath::new(&self.root_path, &self.name)?)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
