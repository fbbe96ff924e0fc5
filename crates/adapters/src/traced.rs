// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced coordination wrappers for consistent observability

use ilock_core::coordination::{CoordinationClient, CoordinationError, MutexHandle};
use std::time::{Duration, Instant};

/// Wrapper that adds tracing to any CoordinationClient
#[derive(Clone)]
pub struct TracedCoordinationClient<C> {
    inner: C,
}

impl<C> TracedCoordinationClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: CoordinationClient> CoordinationClient for TracedCoordinationClient<C> {
    fn new_mutex(&self, path: &str) -> Result<Box<dyn MutexHandle>, CoordinationError> {
        let span = tracing::debug_span!("coordination.new_mutex", path);
        let _guard = span.enter();

        match self.inner.new_mutex(path) {
            Ok(handle) => {
                tracing::debug!("mutex created");
                Ok(Box::new(TracedMutexHandle { inner: handle }))
            }
            Err(e) => {
                tracing::error!(error = %e, "mutex creation failed");
                Err(e)
            }
        }
    }
}

/// Mutex handle whose calls are logged with timings
pub struct TracedMutexHandle {
    inner: Box<dyn MutexHandle>,
}

impl MutexHandle for TracedMutexHandle {
    fn path(&self) -> &str {
        self.inner.path()
    }

    fn is_available(&self) -> bool {
        let available = self.inner.is_available();
        tracing::trace!(path = self.inner.path(), available, "checked");
        available
    }

    fn try_acquire(&self, timeout: Duration) -> Result<bool, CoordinationError> {
        let span = tracing::info_span!(
            "mutex.acquire",
            path = self.inner.path(),
            timeout_ms = timeout.as_millis() as u64
        );
        let _guard = span.enter();

        let start = Instant::now();
        let result = self.inner.try_acquire(timeout);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(true) => tracing::info!(elapsed_ms, "acquired"),
            Ok(false) => tracing::warn!(elapsed_ms, "timed out"),
            Err(e) => tracing::error!(elapsed_ms, error = %e, "acquire failed"),
        }

        result
    }

    fn release(&self) -> Result<(), CoordinationError> {
        let span = tracing::info_span!("mutex.release", path = self.inner.path());
        let _guard = span.enter();

        let result = self.inner.release();
        match &result {
            Ok(()) => tracing::info!("released"),
            Err(e) => tracing::error!(error = %e, "release failed"),
        }

        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
