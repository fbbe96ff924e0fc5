// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock registries: one lock instance per live application key
//!
//! Call sites that pass structurally equal keys share a lock, which is what
//! makes in-process exclusion meaningful across unrelated code paths.

pub mod best_effort;
pub mod cache;
pub mod local;

pub use best_effort::BestEffortLockRegistry;
pub use cache::LockCache;
pub use local::LocalLockRegistry;

use crate::coordination::{CoordinationError, ReentrantLock};
use crate::key::KeyError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors from looking up a lock
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid lock key: {0}")]
    InvalidKey(#[from] KeyError),
    #[error("failed to create lock for {path}: {source}")]
    LockCreation {
        path: String,
        #[source]
        source: CoordinationError,
    },
}

/// Source of reentrant locks keyed by application keys of type `K`
pub trait LockRegistry<K: ?Sized>: Send + Sync {
    type Lock: ReentrantLock;

    /// The lock for `key`, shared with every other caller currently holding it
    fn get_lock(&self, key: &K) -> Result<Arc<Self::Lock>, RegistryError>;

    /// How long callers should wait for a lock before giving up, if bounded
    fn timeout(&self) -> Option<Duration>;
}

impl<K: ?Sized, R: LockRegistry<K> + ?Sized> LockRegistry<K> for Arc<R> {
    type Lock = R::Lock;

    fn get_lock(&self, key: &K) -> Result<Arc<R::Lock>, RegistryError> {
        (**self).get_lock(key)
    }

    fn timeout(&self) -> Option<Duration> {
        (**self).timeout()
    }
}

impl<K: ?Sized, R: LockRegistry<K> + ?Sized> LockRegistry<K> for &R {
    type Lock = R::Lock;

    fn get_lock(&self, key: &K) -> Result<Arc<R::Lock>, RegistryError> {
        (**self).get_lock(key)
    }

    fn timeout(&self) -> Option<Duration> {
        (**self).timeout()
    }
}
