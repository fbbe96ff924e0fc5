// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reachability-based lock cache
//!
//! An entry stays cached while some caller holds an `Arc` to its lock or some
//! thread holds the lock itself. A lock that is locked but no longer
//! referenced is therefore still the one handed out by the next lookup, so
//! its owner can find it again to unlock it. Entries that are neither are
//! swept as the map grows.

use crate::coordination::ReentrantLock;
use crate::key::LockKey;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Unused entries are swept once the map grows past this size
const MIN_SWEEP_THRESHOLD: usize = 64;

/// Referenced outside the cache, or held by some thread
fn in_use<L: ReentrantLock>(lock: &Arc<L>) -> bool {
    Arc::strong_count(lock) > 1 || lock.is_locked()
}

struct Entries<L> {
    map: HashMap<LockKey, Arc<L>>,
    sweep_at: usize,
}

impl<L: ReentrantLock> Entries<L> {
    fn purge(&mut self) -> usize {
        let before = self.map.len();
        // Only the map references an unused entry, so no caller can revive it
        // while this lock is held.
        self.map.retain(|_, lock| in_use(lock));
        self.sweep_at = MIN_SWEEP_THRESHOLD.max(self.map.len() * 2);
        before - self.map.len()
    }
}

/// Single-flight map from lock key to lock instance
pub struct LockCache<L> {
    entries: Mutex<Entries<L>>,
}

impl<L: ReentrantLock> LockCache<L> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                sweep_at: MIN_SWEEP_THRESHOLD,
            }),
        }
    }

    /// The cached lock for `key`, if there is one
    pub fn get(&self, key: &LockKey) -> Option<Arc<L>> {
        self.entries.lock().map.get(key).cloned()
    }

    /// Return the live lock for `key`, creating one if there is none.
    ///
    /// `create` runs outside the cache lock, so two racing callers may both
    /// build a candidate. Only the first to install wins; the loser's
    /// candidate is dropped and every caller gets the installed instance.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &LockKey,
        create: impl FnOnce() -> Result<L, E>,
    ) -> Result<Arc<L>, E> {
        if let Some(lock) = self.get(key) {
            return Ok(lock);
        }

        let candidate = Arc::new(create()?);

        let mut entries = self.entries.lock();
        if let Some(installed) = entries.map.get(key).cloned() {
            tracing::debug!(key = %key, "discarding duplicate lock construction");
            return Ok(installed);
        }

        entries.map.insert(key.clone(), Arc::clone(&candidate));
        if entries.map.len() >= entries.sweep_at {
            let swept = entries.purge();
            tracing::trace!(swept, remaining = entries.map.len(), "swept lock cache");
        }
        Ok(candidate)
    }

    pub fn get_or_insert_with(&self, key: &LockKey, create: impl FnOnce() -> L) -> Arc<L> {
        match self.get_or_try_insert_with(key, || Ok::<L, std::convert::Infallible>(create())) {
            Ok(lock) => lock,
            Err(never) => match never {},
        }
    }

    /// Number of entries whose lock is referenced by a caller or held
    pub fn len(&self) -> usize {
        self.entries.lock().map.values().filter(|lock| in_use(lock)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose lock is neither referenced nor held, returning how many
    pub fn purge(&self) -> usize {
        self.entries.lock().purge()
    }
}

impl<L: ReentrantLock> Default for LockCache<L> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
