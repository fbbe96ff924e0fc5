//! Degraded mode specs
//!
//! Verify a registry without a coordination client behaves exactly like a
//! local reentrant lock registry.

use crate::prelude::*;

#[test]
fn degraded_registry_reports_itself() {
    let process = Process::degraded();
    assert!(process.registry.is_degraded());
}

#[test]
fn degraded_locks_are_reentrant_and_exclusive() {
    let process = Process::degraded();
    let lock = process.registry.get_lock("A").unwrap();

    lock.lock();
    lock.lock();
    assert_eq!(lock.hold_count(), 2);
    assert_eq!(lock.phase(), LockPhase::LocalOnly);

    let registry = Arc::clone(&process.registry);
    let other = thread::spawn(move || {
        let lock = registry.get_lock("A").unwrap();
        lock.try_lock_for(Duration::from_millis(30))
    })
    .join()
    .unwrap();
    assert!(!other);

    lock.unlock().unwrap();
    lock.unlock().unwrap();
    assert!(!lock.is_locked());
}

#[test]
fn degraded_mode_never_reports_failures() {
    let process = Process::degraded();

    for key in ["A", "B", "C"] {
        let lock = process.registry.get_lock(key).unwrap();
        let _held = lock.acquire();
        assert!(lock.try_lock());
        lock.unlock().unwrap();
    }

    assert!(process.failures().is_empty());
}

#[test]
fn unlock_from_wrong_thread_is_a_caller_error() {
    let process = Process::degraded();
    let lock = process.registry.get_lock("A").unwrap();
    lock.lock();

    let registry = Arc::clone(&process.registry);
    let result = thread::spawn(move || registry.get_lock("A").unwrap().unlock())
        .join()
        .unwrap();

    assert!(result.is_err());
    assert!(lock.is_locked());
    lock.unlock().unwrap();
}
