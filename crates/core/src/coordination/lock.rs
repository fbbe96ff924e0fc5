// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort inter-process reentrant lock
//!
//! Layers an optional distributed mutex on top of a [`LocalLock`]. The local
//! lock always provides the full reentrant contract; the distributed mutex is
//! engaged once per holding cycle, on the 0 → 1 hold transition, and released
//! on the 1 → 0 transition. Any distributed failure is reported to the
//! [`FailureObserver`] and the lock carries on as local-only.
//!
//! ```text
//!                 lock() [d=0], mutex acquired
//!   UNLOCKED ─────────────────────────────────────▶ LOCAL_AND_DISTRIBUTED
//!      │  ▲                                                 │
//!      │  └────────── unlock() [d=1], mutex released ───────┘
//!      │  lock() [d=0], no mutex or mutex failed
//!      ▼
//!   LOCAL_ONLY ── unlock() [d=1] ──▶ UNLOCKED
//! ```

use super::client::{CoordinationError, MutexHandle};
use super::local::{LocalLock, CANCEL_POLL_INTERVAL};
use super::observer::{FailureObserver, LockFailure};
use super::reentrant::{LockError, ReentrantLock};
use crate::cancel::CancelToken;
use crate::key::LockKey;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Observable state of a best-effort lock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockPhase {
    Unlocked,
    /// Held locally; the distributed mutex is not engaged
    LocalOnly,
    /// Held locally and the distributed mutex is held by this process
    LocalAndDistributed,
}

/// Distributed half of a best-effort lock
struct DistributedMutex {
    handle: Box<dyn MutexHandle>,
    observer: Arc<dyn FailureObserver>,
    acquire_timeout: Duration,
    /// Whether this process currently holds `handle`
    held: AtomicBool,
}

impl DistributedMutex {
    /// Try to engage the mutex within `budget`, reporting any failure.
    ///
    /// With a `cancel` token the attempt is split into short slices so that
    /// a cancellation ends it early. A cancelled attempt is not a failure of
    /// the coordination service and is not reported.
    fn engage(&self, budget: Duration, cancel: Option<&CancelToken>) {
        let path = self.handle.path();

        if !self.handle.is_available() {
            self.report(LockFailure::Unavailable {
                path: path.to_string(),
            });
            return;
        }

        let outcome = match cancel {
            Some(cancel) => self.try_acquire_cancellable(budget, cancel),
            None => self.handle.try_acquire(budget),
        };
        match outcome {
            Ok(true) => {
                self.held.store(true, Ordering::SeqCst);
                tracing::debug!(path, "distributed mutex acquired");
            }
            Ok(false) if cancel.is_some_and(CancelToken::is_cancelled) => {
                tracing::debug!(path, "distributed acquire cancelled");
            }
            Ok(false) => self.report(LockFailure::AcquireTimedOut {
                path: path.to_string(),
                timeout: budget,
            }),
            Err(source) => self.report(LockFailure::AcquireFailed {
                path: path.to_string(),
                source,
            }),
        }
    }

    fn try_acquire_cancellable(
        &self,
        budget: Duration,
        cancel: &CancelToken,
    ) -> Result<bool, CoordinationError> {
        let deadline = Instant::now() + budget;
        loop {
            if cancel.is_cancelled() {
                return Ok(false);
            }
            let started = Instant::now();
            let remaining = deadline.saturating_duration_since(started);
            let slice = remaining.min(CANCEL_POLL_INTERVAL);
            if self.handle.try_acquire(slice)? {
                return Ok(true);
            }
            if remaining <= CANCEL_POLL_INTERVAL {
                return Ok(false);
            }
            // Some handles give up before their timeout
            std::thread::sleep(slice.saturating_sub(started.elapsed()));
        }
    }

    /// Release the mutex if this process holds it
    fn disengage(&self) {
        if !self.held.swap(false, Ordering::SeqCst) {
            return;
        }

        let path = self.handle.path();
        match self.handle.release() {
            Ok(()) => tracing::debug!(path, "distributed mutex released"),
            Err(source) => self.report(LockFailure::ReleaseFailed {
                path: path.to_string(),
                source,
            }),
        }
    }

    fn report(&self, failure: LockFailure) {
        self.observer.on_failure(&failure);
    }
}

/// Reentrant lock that also tries to hold a distributed mutex
///
/// Without a distributed mutex (degraded mode) this is a plain
/// [`LocalLock`]: no coordination calls and no observer calls are made.
pub struct BestEffortLock {
    key: LockKey,
    local: LocalLock,
    distributed: Option<DistributedMutex>,
}

impl BestEffortLock {
    /// A lock with no distributed layer
    pub fn local_only(key: LockKey, fair: bool) -> Self {
        Self {
            key,
            local: LocalLock::with_fairness(fair),
            distributed: None,
        }
    }

    /// A lock that engages `handle` on every holding cycle
    pub fn with_mutex(
        key: LockKey,
        fair: bool,
        handle: Box<dyn MutexHandle>,
        observer: Arc<dyn FailureObserver>,
        acquire_timeout: Duration,
    ) -> Self {
        Self {
            key,
            local: LocalLock::with_fairness(fair),
            distributed: Some(DistributedMutex {
                handle,
                observer,
                acquire_timeout,
                held: AtomicBool::new(false),
            }),
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// Coordination path of the distributed mutex, if there is one
    pub fn path(&self) -> Option<&str> {
        self.distributed.as_ref().map(|d| d.handle.path())
    }

    pub fn is_fair(&self) -> bool {
        self.local.is_fair()
    }

    pub fn queue_length(&self) -> usize {
        self.local.queue_length()
    }

    /// Whether the distributed mutex is currently held by this process
    pub fn is_distributed(&self) -> bool {
        self.distributed
            .as_ref()
            .is_some_and(|d| d.held.load(Ordering::SeqCst))
    }

    pub fn phase(&self) -> LockPhase {
        if !self.local.is_locked() {
            LockPhase::Unlocked
        } else if self.is_distributed() {
            LockPhase::LocalAndDistributed
        } else {
            LockPhase::LocalOnly
        }
    }

    /// Engage the distributed mutex if this thread just took its first hold
    fn after_local_acquire(&self, budget: Duration) {
        if self.local.hold_count() != 1 {
            return;
        }
        if let Some(distributed) = &self.distributed {
            distributed.engage(budget, None);
        }
    }

    fn acquire_timeout(&self) -> Duration {
        self.distributed
            .as_ref()
            .map_or(Duration::ZERO, |d| d.acquire_timeout)
    }
}

impl ReentrantLock for BestEffortLock {
    fn lock(&self) {
        self.local.lock();
        self.after_local_acquire(self.acquire_timeout());
    }

    fn unlock(&self) -> Result<(), LockError> {
        if !self.local.is_held_by_current_thread() {
            return Err(LockError::IllegalMonitorState);
        }
        if self.local.hold_count() == 1 {
            if let Some(distributed) = &self.distributed {
                distributed.disengage();
            }
        }
        self.local.unlock()
    }

    fn try_lock(&self) -> bool {
        if !self.local.try_lock() {
            return false;
        }
        self.after_local_acquire(Duration::ZERO);
        true
    }

    fn try_lock_for(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        if !self.local.try_lock_for(timeout) {
            return false;
        }
        let remaining = timeout.saturating_sub(start.elapsed());
        self.after_local_acquire(self.acquire_timeout().min(remaining));
        true
    }

    fn lock_interruptibly(&self, cancel: &CancelToken) -> Result<(), LockError> {
        self.local.lock_interruptibly(cancel)?;
        if self.local.hold_count() != 1 {
            return Ok(());
        }
        let Some(distributed) = &self.distributed else {
            return Ok(());
        };

        if !cancel.is_cancelled() {
            distributed.engage(distributed.acquire_timeout, Some(cancel));
        }
        if cancel.is_cancelled() {
            // A cancelled call must not return holding the lock
            tracing::debug!(key = %self.key, "cancelled during distributed acquire, rolling back");
            distributed.disengage();
            self.local.unlock()?;
            return Err(LockError::Interrupted);
        }
        Ok(())
    }

    fn is_held_by_current_thread(&self) -> bool {
        self.local.is_held_by_current_thread()
    }

    fn hold_count(&self) -> usize {
        self.local.hold_count()
    }

    fn is_locked(&self) -> bool {
        self.local.is_locked()
    }
}

impl Drop for BestEffortLock {
    fn drop(&mut self) {
        if let Some(distributed) = &self.distributed {
            if distributed.held.load(Ordering::SeqCst) {
                tracing::debug!(key = %self.key, "releasing distributed mutex of dropped lock");
            }
            distributed.disengage();
        }
    }
}

impl std::fmt::Debug for BestEffortLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BestEffortLock")
            .field("key", &self.key)
            .field("path", &self.path())
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
