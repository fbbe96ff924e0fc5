// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process reentrant lock with explicit lock/unlock
//!
//! This is the authoritative primitive behind every lock handed out by a
//! registry: it owns thread identity, hold depth and queueing order.

use super::reentrant::{LockError, ReentrantLock};
use crate::cancel::CancelToken;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

/// How often an interruptible wait re-checks its cancel token
pub(super) const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct LockState {
    owner: Option<ThreadId>,
    holds: usize,
    next_ticket: u64,
    /// Tickets of blocked threads, oldest first
    waiters: VecDeque<u64>,
}

impl LockState {
    fn grant(&mut self, owner: ThreadId) {
        self.owner = Some(owner);
        self.holds = 1;
    }

    fn dequeue(&mut self, ticket: u64) {
        self.waiters.retain(|t| *t != ticket);
    }
}

/// Reentrant mutex whose holds are released explicitly
///
/// A fair lock hands off to blocked threads in arrival order; an unfair one
/// lets any woken or arriving thread take a free lock.
#[derive(Debug)]
pub struct LocalLock {
    state: Mutex<LockState>,
    released: Condvar,
    fair: bool,
}

impl LocalLock {
    /// A fair lock
    pub fn new() -> Self {
        Self::with_fairness(true)
    }

    pub fn with_fairness(fair: bool) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            released: Condvar::new(),
            fair,
        }
    }

    pub fn is_fair(&self) -> bool {
        self.fair
    }

    /// Number of threads blocked waiting for this lock
    pub fn queue_length(&self) -> usize {
        self.state.lock().waiters.len()
    }

    pub fn has_queued_threads(&self) -> bool {
        self.queue_length() > 0
    }

    /// Core acquisition loop.
    ///
    /// Returns `Ok(false)` when the deadline passes and `Err(Interrupted)` when
    /// the token fires before the lock is granted.
    fn acquire_until(
        &self,
        deadline: Option<Instant>,
        cancel: Option<&CancelToken>,
    ) -> Result<bool, LockError> {
        let cancelled = || cancel.is_some_and(CancelToken::is_cancelled);
        if cancelled() {
            return Err(LockError::Interrupted);
        }

        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.owner == Some(me) {
            state.holds += 1;
            return Ok(true);
        }
        if state.owner.is_none() && (!self.fair || state.waiters.is_empty()) {
            state.grant(me);
            return Ok(true);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Ok(false);
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.waiters.push_back(ticket);

        loop {
            let poll_at = cancel.map(|_| Instant::now() + CANCEL_POLL_INTERVAL);
            match (deadline, poll_at) {
                (Some(d), Some(p)) => {
                    self.released.wait_until(&mut state, d.min(p));
                }
                (Some(at), None) | (None, Some(at)) => {
                    self.released.wait_until(&mut state, at);
                }
                (None, None) => self.released.wait(&mut state),
            }

            let my_turn = !self.fair || state.waiters.front() == Some(&ticket);
            if state.owner.is_none() && my_turn {
                state.dequeue(ticket);
                state.grant(me);
                return Ok(true);
            }

            let outcome = if cancelled() {
                Some(Err(LockError::Interrupted))
            } else if deadline.is_some_and(|d| Instant::now() >= d) {
                Some(Ok(false))
            } else {
                None
            };

            if let Some(outcome) = outcome {
                state.dequeue(ticket);
                // the next waiter may now be at the front of a free lock
                drop(state);
                self.released.notify_all();
                return outcome;
            }
        }
    }
}

impl Default for LocalLock {
    fn default() -> Self {
        Self::new()
    }
}

impl ReentrantLock for LocalLock {
    fn lock(&self) {
        // Without a deadline or token the loop only returns on grant
        let _ = self.acquire_until(None, None);
    }

    fn unlock(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.owner != Some(me) || state.holds == 0 {
            return Err(LockError::IllegalMonitorState);
        }

        state.holds -= 1;
        if state.holds == 0 {
            state.owner = None;
            drop(state);
            self.released.notify_all();
        }
        Ok(())
    }

    fn try_lock(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();

        match state.owner {
            Some(owner) if owner == me => {
                state.holds += 1;
                true
            }
            Some(_) => false,
            // Barges even when fair, matching the usual try-lock contract
            None => {
                state.grant(me);
                true
            }
        }
    }

    fn try_lock_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        self.acquire_until(deadline, None).unwrap_or(false)
    }

    fn lock_interruptibly(&self, cancel: &CancelToken) -> Result<(), LockError> {
        self.acquire_until(None, Some(cancel)).map(|_| ())
    }

    fn is_held_by_current_thread(&self) -> bool {
        self.state.lock().owner == Some(thread::current().id())
    }

    fn hold_count(&self) -> usize {
        let state = self.state.lock();
        if state.owner == Some(thread::current().id()) {
            state.holds
        } else {
            0
        }
    }

    fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
