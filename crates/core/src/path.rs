// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination service paths
//!
//! Every lock of a registry lives under `<root>/<registry-name>/`, with the
//! lock key as the final segment.

use crate::key::LockKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from building coordination paths
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("undefined root path for coordination mutexes")]
    BlankRoot,
    #[error("invalid registry name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },
}

/// Name of a lock registry: a single word usable as a path segment
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegistryName(String);

impl RegistryName {
    pub fn new(name: impl Into<String>) -> Result<Self, PathError> {
        let name = name.into();
        let invalid = |reason| PathError::InvalidName {
            name: name.clone(),
            reason,
        };

        if name.is_empty() {
            return Err(invalid("empty"));
        }
        if name == "." || name == ".." {
            return Err(invalid("relative path component"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(invalid("contains whitespace"));
        }
        if name.chars().any(|c| c == '/' || c == '\\' || c.is_control()) {
            return Err(invalid("contains a path separator or control character"));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegistryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RegistryName {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegistryName> for String {
    fn from(name: RegistryName) -> Self {
        name.0
    }
}

/// Directory under which a registry's mutexes are created
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryPath(String);

impl RegistryPath {
    /// Join a root path and a registry name into `<root>/<name>/`.
    ///
    /// Trailing separators on the root are collapsed, so `"/locks"` and
    /// `"/locks/"` name the same directory.
    pub fn new(root: &str, name: &RegistryName) -> Result<Self, PathError> {
        let root = root.trim();
        if root.is_empty() {
            return Err(PathError::BlankRoot);
        }
        let root = root.trim_end_matches('/');
        Ok(Self(format!("{root}/{name}/")))
    }

    /// Full coordination path of the mutex guarding `key`
    pub fn lock_path(&self, key: &LockKey) -> String {
        format!("{}{}", self.0, key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegistryPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
