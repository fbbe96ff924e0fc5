// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run closures while holding a registry lock
//!
//! The lock is held through a [`HeldLock`](crate::coordination::HeldLock)
//! guard, so it is released on every exit path, unwinding included.

use crate::cancel::CancelToken;
use crate::coordination::{LockError, ReentrantLock};
use crate::registry::{LockRegistry, RegistryError};
use std::marker::PhantomData;
use std::time::Duration;
use thiserror::Error;

/// Errors from running a closure under a lock
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("timed out after {0:?} waiting for lock")]
    TimedOut(Duration),
}

/// Run `f` holding the lock for `key`
///
/// Waits at most the registry's timeout when it has one, otherwise blocks
/// until the lock is free.
pub fn synchronized<K, R, T>(registry: &R, key: &K, f: impl FnOnce() -> T) -> Result<T, SyncError>
where
    K: ?Sized,
    R: LockRegistry<K> + ?Sized,
{
    let lock = registry.get_lock(key)?;
    let _held = match registry.timeout() {
        Some(timeout) => match lock.try_acquire_for(timeout) {
            Some(held) => held,
            None => {
                tracing::warn!(?timeout, "gave up waiting for lock");
                return Err(SyncError::TimedOut(timeout));
            }
        },
        None => lock.acquire(),
    };
    Ok(f())
}

/// Run `f` holding the lock for `key`, unless `cancel` fires while waiting
pub fn synchronized_interruptibly<K, R, T>(
    registry: &R,
    key: &K,
    cancel: &CancelToken,
    f: impl FnOnce() -> T,
) -> Result<T, SyncError>
where
    K: ?Sized,
    R: LockRegistry<K> + ?Sized,
{
    let lock = registry.get_lock(key)?;
    let _held = lock.acquire_interruptibly(cancel)?;
    Ok(f())
}

/// A registry bound to a rule for deriving the lock key from call arguments
///
/// ```ignore
/// let sync = Synchronizer::new(registry, |order: &Order| order.account.as_str());
/// sync.call(&order, |order| apply(order))?;
/// ```
pub struct Synchronizer<A: ?Sized, K: ?Sized, R, X> {
    registry: R,
    extract: X,
    _args: PhantomData<fn(&A) -> &K>,
}

impl<A, K, R, X> Synchronizer<A, K, R, X>
where
    A: ?Sized,
    K: ?Sized,
    R: LockRegistry<K>,
    X: Fn(&A) -> &K,
{
    pub fn new(registry: R, extract: X) -> Self {
        Self {
            registry,
            extract,
            _args: PhantomData,
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Run `f(args)` holding the lock for the key extracted from `args`
    pub fn call<T>(&self, args: &A, f: impl FnOnce(&A) -> T) -> Result<T, SyncError> {
        let key = (self.extract)(args);
        synchronized(&self.registry, key, || f(args))
    }

    pub fn call_interruptibly<T>(
        &self,
        args: &A,
        cancel: &CancelToken,
        f: impl FnOnce(&A) -> T,
    ) -> Result<T, SyncError> {
        let key = (self.extract)(args);
        synchronized_interruptibly(&self.registry, key, cancel, || f(args))
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
