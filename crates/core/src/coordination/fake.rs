// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake coordination client for testing
//!
//! One `FakeCoordinationClient` plays the role of a coordination service
//! shared by every registry it is handed to, so several registries in one
//! test behave like several processes contending for the same paths.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::client::{CoordinationClient, CoordinationError, MutexHandle};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Behavior of the fake service
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FakeMode {
    /// Mutexes work like a real service
    #[default]
    Healthy,
    /// `is_available` is false and every call errors
    Unavailable,
    /// Every acquire attempt times out immediately
    AcquireTimesOut,
    /// Every acquire attempt fails with a connection error
    AcquireFails,
    /// Acquires work; releases fail and leave the mutex held
    ReleaseFails,
}

/// Recorded call against the fake service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutexCall {
    Create { path: String },
    Acquire { path: String, timeout: Duration },
    Release { path: String },
}

#[derive(Default)]
struct FakeState {
    mode: FakeMode,
    fail_creation: bool,
    /// path -> handle id currently holding it
    owners: HashMap<String, u64>,
    next_handle: u64,
    calls: Vec<MutexCall>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<FakeState>,
    released: Condvar,
}

/// In-memory coordination service with fault injection
#[derive(Clone, Default)]
pub struct FakeCoordinationClient {
    shared: Arc<Shared>,
}

impl FakeCoordinationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: FakeMode) -> Self {
        let client = Self::new();
        client.set_mode(mode);
        client
    }

    pub fn set_mode(&self, mode: FakeMode) {
        self.shared.state.lock().mode = mode;
    }

    /// Make `new_mutex` fail, as a misconfigured client would
    pub fn set_fail_creation(&self, fail: bool) {
        self.shared.state.lock().fail_creation = fail;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<MutexCall> {
        self.shared.state.lock().calls.clone()
    }

    pub fn acquire_calls(&self) -> usize {
        self.count_calls(|c| matches!(c, MutexCall::Acquire { .. }))
    }

    pub fn release_calls(&self) -> usize {
        self.count_calls(|c| matches!(c, MutexCall::Release { .. }))
    }

    pub fn create_calls(&self) -> usize {
        self.count_calls(|c| matches!(c, MutexCall::Create { .. }))
    }

    /// Whether some handle currently holds `path`
    pub fn is_held(&self, path: &str) -> bool {
        self.shared.state.lock().owners.contains_key(path)
    }

    fn count_calls(&self, pred: impl Fn(&MutexCall) -> bool) -> usize {
        self.shared.state.lock().calls.iter().filter(|c| pred(c)).count()
    }
}

impl CoordinationClient for FakeCoordinationClient {
    fn new_mutex(&self, path: &str) -> Result<Box<dyn MutexHandle>, CoordinationError> {
        let mut state = self.shared.state.lock();
        state.calls.push(MutexCall::Create {
            path: path.to_string(),
        });
        if state.fail_creation {
            return Err(CoordinationError::Protocol(
                "client is not started".to_string(),
            ));
        }

        state.next_handle += 1;
        Ok(Box::new(FakeMutexHandle {
            id: state.next_handle,
            path: path.to_string(),
            shared: Arc::clone(&self.shared),
        }))
    }
}

/// Mutex handed out by [`FakeCoordinationClient`]
pub struct FakeMutexHandle {
    id: u64,
    path: String,
    shared: Arc<Shared>,
}

impl MutexHandle for FakeMutexHandle {
    fn path(&self) -> &str {
        &self.path
    }

    fn is_available(&self) -> bool {
        self.shared.state.lock().mode != FakeMode::Unavailable
    }

    fn try_acquire(&self, timeout: Duration) -> Result<bool, CoordinationError> {
        let mut state = self.shared.state.lock();
        state.calls.push(MutexCall::Acquire {
            path: self.path.clone(),
            timeout,
        });

        match state.mode {
            FakeMode::Unavailable => {
                return Err(CoordinationError::Unavailable("no session".to_string()))
            }
            FakeMode::AcquireTimesOut => return Ok(false),
            FakeMode::AcquireFails => {
                return Err(CoordinationError::Connection(
                    "connection refused".to_string(),
                ))
            }
            FakeMode::Healthy | FakeMode::ReleaseFails => {}
        }

        let deadline = Instant::now().checked_add(timeout);
        loop {
            match state.owners.get(&self.path) {
                None => {
                    state.owners.insert(self.path.clone(), self.id);
                    return Ok(true);
                }
                Some(owner) if *owner == self.id => return Ok(true),
                Some(_) => {}
            }

            match deadline {
                Some(d) if Instant::now() >= d => return Ok(false),
                Some(d) => {
                    self.shared.released.wait_until(&mut state, d);
                }
                None => self.shared.released.wait(&mut state),
            }
        }
    }

    fn release(&self) -> Result<(), CoordinationError> {
        let mut state = self.shared.state.lock();
        state.calls.push(MutexCall::Release {
            path: self.path.clone(),
        });

        match state.mode {
            FakeMode::Unavailable => {
                return Err(CoordinationError::Unavailable("no session".to_string()))
            }
            FakeMode::ReleaseFails => {
                return Err(CoordinationError::Connection("session expired".to_string()))
            }
            _ => {}
        }

        if state.owners.get(&self.path) != Some(&self.id) {
            return Err(CoordinationError::NotHeld(self.path.clone()));
        }
        state.owners.remove(&self.path);
        drop(state);
        self.shared.released.notify_all();
        Ok(())
    }
}
