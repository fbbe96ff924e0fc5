// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! ilock-core: best-effort inter-process reentrant locks
//!
//! This crate provides:
//! - Reentrant, thread-owned locks that guarantee mutual exclusion within a process
//! - An optional distributed layer that extends exclusion to other processes
//!   while the coordination service is healthy, and degrades silently when not
//! - Registries that hand out one lock per live application key
//! - A synchronized wrapper for running closures under a keyed lock

pub mod cancel;
pub mod config;
pub mod coordination;
pub mod key;
pub mod path;
pub mod registry;
pub mod sync;

pub use cancel::CancelToken;
pub use config::{ConfigError, RegistryConfig};
pub use coordination::{
    BestEffortLock, CoordinationClient, CoordinationError, FailureObserver, HeldLock, LocalLock,
    LockError, LockFailure, LockPhase, LogObserver, MutexHandle, ReentrantLock,
};
pub use key::{FnKeyFactory, KeyError, KeyFactory, LockKey, SerdeKeyFactory, StringKeyFactory};
pub use path::{PathError, RegistryName, RegistryPath};
pub use registry::{BestEffortLockRegistry, LocalLockRegistry, LockRegistry, RegistryError};
pub use sync::{synchronized, synchronized_interruptibly, SyncError, Synchronizer};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use coordination::{
    FailureRecord, FakeCoordinationClient, FakeMode, FakeMutexHandle, MutexCall,
    RecordingObserver,
};
