// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of in-memory locks
//!
//! Protects a single process only; unsuitable where several processes share
//! a resource.

use super::cache::LockCache;
use super::{LockRegistry, RegistryError};
use crate::coordination::LocalLock;
use crate::key::KeyFactory;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

pub struct LocalLockRegistry<K: ?Sized, F> {
    key_factory: F,
    locks: LockCache<LocalLock>,
    timeout: Option<Duration>,
    fair: bool,
    _key: PhantomData<fn(&K)>,
}

impl<K: ?Sized, F: KeyFactory<K>> LocalLockRegistry<K, F> {
    pub fn new(key_factory: F) -> Self {
        Self {
            key_factory,
            locks: LockCache::new(),
            timeout: None,
            fair: true,
            _key: PhantomData,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_fairness(mut self, fair: bool) -> Self {
        self.fair = fair;
        self
    }

    /// Number of locks still referenced by callers or held
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    pub fn purge(&self) -> usize {
        self.locks.purge()
    }
}

impl<K: ?Sized, F: KeyFactory<K>> LockRegistry<K> for LocalLockRegistry<K, F> {
    type Lock = LocalLock;

    fn get_lock(&self, key: &K) -> Result<Arc<LocalLock>, RegistryError> {
        let key = self.key_factory.to_key(key)?;
        let fair = self.fair;
        Ok(self
            .locks
            .get_or_insert_with(&key, || LocalLock::with_fairness(fair)))
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
