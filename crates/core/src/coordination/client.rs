// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination service capabilities consumed by best-effort locks
//!
//! The service itself (sessions, connection management, wire protocol) lives
//! behind these traits. Locks only ever need to create a mutex for a path,
//! try to acquire it with a bound, and release it.

use std::time::Duration;
use thiserror::Error;

/// Errors reported by a coordination client or one of its mutexes
#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("coordination service unavailable: {0}")]
    Unavailable(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("invalid coordination path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("mutex {0} is not held")]
    NotHeld(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A distributed mutex bound to a single coordination path
pub trait MutexHandle: Send + Sync {
    /// Path this mutex is bound to
    fn path(&self) -> &str;

    /// Whether the backing service can currently be reached
    fn is_available(&self) -> bool {
        true
    }

    /// Try to acquire the mutex, waiting at most `timeout`.
    ///
    /// Returns `Ok(false)` when the timeout elapses without acquiring.
    fn try_acquire(&self, timeout: Duration) -> Result<bool, CoordinationError>;

    /// Release a previously acquired mutex
    fn release(&self) -> Result<(), CoordinationError>;
}

/// Factory for distributed mutexes
pub trait CoordinationClient: Send + Sync {
    /// Create a mutex bound to `path`.
    ///
    /// Failing here indicates a configuration problem with the client, not a
    /// transient service failure.
    fn new_mutex(&self, path: &str) -> Result<Box<dyn MutexHandle>, CoordinationError>;
}
