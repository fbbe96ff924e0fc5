// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sink for coordination failures swallowed by best-effort locks

use super::client::CoordinationError;
use std::time::Duration;
use thiserror::Error;

/// A distributed-layer failure that did not stop a lock operation
#[derive(Debug, Error)]
pub enum LockFailure {
    #[error("coordination service unavailable for {path}")]
    Unavailable { path: String },
    #[error("timed out after {timeout:?} acquiring {path}")]
    AcquireTimedOut { path: String, timeout: Duration },
    #[error("acquiring {path} failed: {source}")]
    AcquireFailed {
        path: String,
        #[source]
        source: CoordinationError,
    },
    #[error("releasing {path} failed: {source}")]
    ReleaseFailed {
        path: String,
        #[source]
        source: CoordinationError,
    },
}

impl LockFailure {
    /// Coordination path of the mutex that failed
    pub fn path(&self) -> &str {
        match self {
            LockFailure::Unavailable { path }
            | LockFailure::AcquireTimedOut { path, .. }
            | LockFailure::AcquireFailed { path, .. }
            | LockFailure::ReleaseFailed { path, .. } => path,
        }
    }

    /// Short name for structured logging
    pub fn kind(&self) -> &'static str {
        match self {
            LockFailure::Unavailable { .. } => "unavailable",
            LockFailure::AcquireTimedOut { .. } => "acquire_timed_out",
            LockFailure::AcquireFailed { .. } => "acquire_failed",
            LockFailure::ReleaseFailed { .. } => "release_failed",
        }
    }
}

/// Receives failures from the distributed layer
///
/// Called synchronously on the locking thread, so implementations must return
/// quickly and must not panic.
pub trait FailureObserver: Send + Sync {
    fn on_failure(&self, failure: &LockFailure);
}

/// Default observer: logs each failure as a structured error event
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl FailureObserver for LogObserver {
    fn on_failure(&self, failure: &LockFailure) {
        tracing::error!(
            path = failure.path(),
            kind = failure.kind(),
            error = %failure,
            "inter-process locking failed"
        );
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod recording {
    use super::{FailureObserver, LockFailure};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded failure, flattened for assertions
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FailureRecord {
        pub kind: &'static str,
        pub path: String,
        pub message: String,
    }

    /// Observer that remembers every failure it sees
    #[derive(Clone, Default)]
    pub struct RecordingObserver {
        failures: Arc<Mutex<Vec<FailureRecord>>>,
    }

    impl RecordingObserver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failures(&self) -> Vec<FailureRecord> {
            self.failures.lock().clone()
        }

        pub fn count(&self) -> usize {
            self.failures.lock().len()
        }
    }

    impl FailureObserver for RecordingObserver {
        fn on_failure(&self, failure: &LockFailure) {
            self.failures.lock().push(FailureRecord {
                kind: failure.kind(),
                path: failure.path().to_string(),
                message: failure.to_string(),
            });
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::{FailureRecord, RecordingObserver};

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
