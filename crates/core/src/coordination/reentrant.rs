// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reentrant lock contract shared by local and best-effort locks

use crate::cancel::CancelToken;
use std::marker::PhantomData;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by lock operations
///
/// These are caller errors or cancellation. Coordination failures never show
/// up here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LockError {
    #[error("lock is not held by the current thread")]
    IllegalMonitorState,
    #[error("lock acquisition interrupted")]
    Interrupted,
}

/// Thread-owned reentrant mutual exclusion
///
/// The owning thread may lock again without blocking; each `lock` must be
/// matched by an `unlock` from the same thread.
pub trait ReentrantLock: Send + Sync {
    /// Block until the lock is held by the current thread
    fn lock(&self);

    /// Release one hold. Fails when the current thread is not the owner.
    fn unlock(&self) -> Result<(), LockError>;

    /// Acquire only if free (or already owned), without waiting
    fn try_lock(&self) -> bool;

    /// Acquire, waiting at most `timeout`
    fn try_lock_for(&self, timeout: Duration) -> bool;

    /// Acquire unless `cancel` fires first
    fn lock_interruptibly(&self, cancel: &CancelToken) -> Result<(), LockError>;

    fn is_held_by_current_thread(&self) -> bool;

    /// Holds by the current thread; zero for non-owners
    fn hold_count(&self) -> usize;

    /// Whether any thread holds the lock
    fn is_locked(&self) -> bool;

    /// Lock and return a guard that unlocks on drop
    fn acquire(&self) -> HeldLock<'_, Self>
    where
        Self: Sized,
    {
        self.lock();
        HeldLock::new(self)
    }

    /// Like [`try_lock_for`](Self::try_lock_for), returning a guard on success
    fn try_acquire_for(&self, timeout: Duration) -> Option<HeldLock<'_, Self>>
    where
        Self: Sized,
    {
        self.try_lock_for(timeout).then(|| HeldLock::new(self))
    }

    /// Like [`lock_interruptibly`](Self::lock_interruptibly), returning a guard
    fn acquire_interruptibly(&self, cancel: &CancelToken) -> Result<HeldLock<'_, Self>, LockError>
    where
        Self: Sized,
    {
        self.lock_interruptibly(cancel)?;
        Ok(HeldLock::new(self))
    }
}

/// One hold on a [`ReentrantLock`], released when dropped
///
/// Not `Send`: the hold belongs to the thread that took it.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct HeldLock<'a, L: ReentrantLock> {
    lock: &'a L,
    _not_send: PhantomData<*const ()>,
}

impl<'a, L: ReentrantLock> HeldLock<'a, L> {
    fn new(lock: &'a L) -> Self {
        Self {
            lock,
            _not_send: PhantomData,
        }
    }

    pub fn lock(&self) -> &L {
        self.lock
    }
}

impl<L: ReentrantLock> Drop for HeldLock<'_, L> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.unlock() {
            tracing::error!(error = %e, "failed to release held lock");
        }
    }
}
