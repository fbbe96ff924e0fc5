//! Coordination fault specs
//!
//! Verify that service failures are swallowed, reported once per holding
//! cycle, and never weaken in-process exclusion.

use crate::prelude::*;

#[test]
fn outage_degrades_and_recovery_restores_distribution() {
    let service = FakeCoordinationClient::new();
    let process = Process::connected(service.clone());
    let lock = process.registry.get_lock("A").unwrap();

    {
        let _held = lock.acquire();
        assert_eq!(lock.phase(), LockPhase::LocalAndDistributed);
    }

    service.set_mode(FakeMode::Unavailable);
    {
        let _held = lock.acquire();
        assert_eq!(lock.phase(), LockPhase::LocalOnly);
    }

    service.set_mode(FakeMode::Healthy);
    {
        let _held = lock.acquire();
        assert_eq!(lock.phase(), LockPhase::LocalAndDistributed);
    }

    assert_eq!(process.failure_kinds(), vec!["unavailable"]);
}

#[test]
fn connection_errors_are_reported_with_path() {
    let process = Process::connected(FakeCoordinationClient::with_mode(FakeMode::AcquireFails));
    let lock = process.registry.get_lock("A").unwrap();

    assert!(lock.try_lock());
    lock.unlock().unwrap();

    let failures = process.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, "acquire_failed");
    assert_eq!(failures[0].path, "/locks/orders/QQ");
    assert!(failures[0].message.contains("connection refused"));
}

#[test]
fn failed_release_still_frees_the_local_lock() {
    let process = Process::connected(FakeCoordinationClient::with_mode(FakeMode::ReleaseFails));
    let lock = process.registry.get_lock("A").unwrap();

    lock.lock();
    lock.unlock().unwrap();

    let registry = Arc::clone(&process.registry);
    let acquired_elsewhere = thread::spawn(move || {
        let lock = registry.get_lock("A").unwrap();
        let acquired = lock.try_lock();
        if acquired {
            lock.unlock().unwrap();
        }
        acquired
    })
    .join()
    .unwrap();

    assert!(acquired_elsewhere);
    assert!(process.failure_kinds().contains(&"release_failed"));
}

#[test]
fn faults_never_break_in_process_exclusion() {
    let process = Process::connected(FakeCoordinationClient::with_mode(FakeMode::AcquireFails));
    let lock = process.registry.get_lock("A").unwrap();
    let _held = lock.acquire();

    let registry = Arc::clone(&process.registry);
    let other = thread::spawn(move || {
        registry
            .get_lock("A")
            .unwrap()
            .try_lock_for(Duration::from_millis(30))
    })
    .join()
    .unwrap();

    assert!(!other);
}

#[test]
fn lock_creation_failure_surfaces_from_lookup() {
    let service = FakeCoordinationClient::new();
    service.set_fail_creation(true);
    let process = Process::connected(service);

    assert!(process.registry.get_lock("A").is_err());
    assert!(process.failures().is_empty());
}
