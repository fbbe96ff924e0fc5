// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of best-effort inter-process locks
//!
//! The coordination service is never a single point of failure. Without a
//! client the registry hands out plain local locks; with one, each lock also
//! tries to hold a distributed mutex at `<root>/<name>/<lock-key>` and logs,
//! rather than raises, anything that goes wrong there.

use super::cache::LockCache;
use super::{LockRegistry, RegistryError};
use crate::config::{ConfigError, RegistryConfig};
use crate::coordination::{BestEffortLock, CoordinationClient, FailureObserver, LogObserver};
use crate::key::{KeyFactory, LockKey};
use crate::path::RegistryPath;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

pub struct BestEffortLockRegistry<K: ?Sized, F> {
    key_factory: F,
    path: RegistryPath,
    client: Option<Arc<dyn CoordinationClient>>,
    observer: Arc<dyn FailureObserver>,
    acquire_timeout: Duration,
    lock_timeout: Option<Duration>,
    fair: bool,
    locks: LockCache<BestEffortLock>,
    _key: PhantomData<fn(&K)>,
}

impl<K: ?Sized, F: KeyFactory<K>> BestEffortLockRegistry<K, F> {
    /// Build a registry. `client: None` selects degraded, local-only mode.
    pub fn new(
        config: &RegistryConfig,
        key_factory: F,
        client: Option<Arc<dyn CoordinationClient>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let path = config.registry_path()?;

        if client.is_none() {
            tracing::info!(path = %path, "no coordination client, locks are local only");
        }

        Ok(Self {
            key_factory,
            path,
            client,
            observer: Arc::new(LogObserver),
            acquire_timeout: config.acquire_timeout,
            lock_timeout: config.lock_timeout,
            fair: config.fair,
            locks: LockCache::new(),
            _key: PhantomData,
        })
    }

    /// Replace the default logging observer
    pub fn with_observer(mut self, observer: Arc<dyn FailureObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// True when no coordination client is configured
    pub fn is_degraded(&self) -> bool {
        self.client.is_none()
    }

    pub fn registry_path(&self) -> &RegistryPath {
        &self.path
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

    fn create(&self, key: LockKey) -> Result<BestEffortLock, RegistryError> {
        let Some(client) = &self.client else {
            return Ok(BestEffortLock::local_only(key, self.fair));
        };

        let path = self.path.lock_path(&key);
        let handle = client
            .new_mutex(&path)
            .map_err(|source| RegistryError::LockCreation {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(path, "created best-effort lock");

        Ok(BestEffortLock::with_mutex(
            key,
            self.fair,
            handle,
            Arc::clone(&self.observer),
            self.acquire_timeout,
        ))
    }
}

impl<K: ?Sized, F: KeyFactory<K>> LockRegistry<K> for BestEffortLockRegistry<K, F> {
    type Lock = BestEffortLock;

    fn get_lock(&self, key: &K) -> Result<Arc<BestEffortLock>, RegistryError> {
        let key = self.key_factory.to_key(key)?;
        self.locks
            .get_or_try_insert_with(&key, || self.create(key.clone()))
    }

    fn timeout(&self) -> Option<Duration> {
        self.lock_timeout
    }
}

#[cfg(test)]
#[path = "best_effort_tests.rs"]
mod tests;
