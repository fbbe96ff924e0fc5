// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locking primitives
//!
//! This module provides:
//! - **LocalLock** - In-process reentrant lock with FIFO or barging handoff
//! - **BestEffortLock** - Local lock plus an opportunistic distributed mutex
//! - **CoordinationClient / MutexHandle** - What a coordination service must offer
//! - **FailureObserver** - Where swallowed distributed failures are reported

pub mod client;
pub mod local;
pub mod lock;
pub mod observer;
pub mod reentrant;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use client::{CoordinationClient, CoordinationError, MutexHandle};
pub use local::LocalLock;
pub use lock::{BestEffortLock, LockPhase};
pub use observer::{FailureObserver, LockFailure, LogObserver};
pub use reentrant::{HeldLock, LockError, ReentrantLock};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCoordinationClient, FakeMode, FakeMutexHandle, MutexCall};
#[cfg(any(test, feature = "test-support"))]
pub use observer::{FailureRecord, RecordingObserver};
