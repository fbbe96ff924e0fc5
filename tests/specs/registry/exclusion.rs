//! Mutual exclusion specs
//!
//! Verify exclusion inside one process and across processes sharing a
//! healthy coordination service.

use crate::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn threads_in_one_process_never_overlap() {
    let process = Process::connected(FakeCoordinationClient::new());
    let inside = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..6)
        .map(|_| {
            let registry = Arc::clone(&process.registry);
            let inside = Arc::clone(&inside);
            let overlaps = Arc::clone(&overlaps);
            thread::spawn(move || {
                for _ in 0..10 {
                    let lock = registry.get_lock("A").unwrap();
                    let _held = lock.acquire();
                    if inside.fetch_add(1, Ordering::SeqCst) != 0 {
                        overlaps.fetch_add(1, Ordering::SeqCst);
                    }
                    thread::sleep(Duration::from_millis(1));
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert!(process.failures().is_empty());
}

#[test]
fn every_holding_cycle_holds_the_distributed_mutex() {
    let service = FakeCoordinationClient::new();
    let process = Process::connected(service.clone());

    for _ in 0..3 {
        let lock = process.registry.get_lock("A").unwrap();
        let _held = lock.acquire();
        assert_eq!(lock.phase(), LockPhase::LocalAndDistributed);
        assert!(service.is_held("/locks/orders/QQ"));
    }

    assert!(!service.is_held("/locks/orders/QQ"));
    assert_eq!(service.acquire_calls(), 3);
    assert_eq!(service.release_calls(), 3);
}

#[test]
fn reentrant_holds_share_one_distributed_cycle() {
    let service = FakeCoordinationClient::new();
    let process = Process::connected(service.clone());
    let lock = process.registry.get_lock("A").unwrap();

    let outer = lock.acquire();
    let inner = lock.acquire();
    assert_eq!(lock.hold_count(), 2);
    drop(inner);
    assert!(service.is_held("/locks/orders/QQ"));
    drop(outer);

    assert_eq!(service.acquire_calls(), 1);
    assert_eq!(service.release_calls(), 1);
}

#[test]
fn second_process_waits_then_degrades_to_local_only() {
    let service = FakeCoordinationClient::new();
    let first = Process::connected(service.clone());
    let second = Process::connected(service.clone());

    let held = first.registry.get_lock("A").unwrap();
    held.lock();

    let contender = second.registry.get_lock("A").unwrap();
    let started = std::time::Instant::now();
    assert!(contender.try_lock_for(Duration::from_millis(500)));
    assert!(started.elapsed() >= ACQUIRE_TIMEOUT);
    assert_eq!(contender.phase(), LockPhase::LocalOnly);
    contender.unlock().unwrap();

    held.unlock().unwrap();
    assert!(first.failures().is_empty());
    assert_eq!(second.failure_kinds(), vec!["acquire_timed_out"]);
}

#[test]
fn process_gets_mutex_once_other_process_releases() {
    let service = FakeCoordinationClient::new();
    let first = Process::connected(service.clone());
    let second = Process::connected(service.clone());

    {
        let lock = first.registry.get_lock("A").unwrap();
        let _held = lock.acquire();
    }

    let lock = second.registry.get_lock("A").unwrap();
    let _held = lock.acquire();
    assert_eq!(lock.phase(), LockPhase::LocalAndDistributed);
    assert!(second.failures().is_empty());
}

#[test]
fn different_keys_do_not_contend() {
    let service = FakeCoordinationClient::new();
    let first = Process::connected(service.clone());
    let second = Process::connected(service.clone());

    let a = first.registry.get_lock("A").unwrap();
    let b = second.registry.get_lock("B").unwrap();
    let _a = a.acquire();
    let _b = b.acquire();

    assert_eq!(a.phase(), LockPhase::LocalAndDistributed);
    assert_eq!(b.phase(), LockPhase::LocalAndDistributed);
}

#[test]
fn registries_with_different_names_use_different_paths() {
    let service = FakeCoordinationClient::new();
    let orders = Process::connected(service.clone());
    let billing_config =
        RegistryConfig::new("/locks", RegistryName::new("billing").unwrap())
            .with_acquire_timeout(ACQUIRE_TIMEOUT);
    let billing = Process::with_config(&billing_config, service.clone());

    let a = orders.registry.get_lock("A").unwrap();
    let b = billing.registry.get_lock("A").unwrap();
    let _a = a.acquire();
    let _b = b.acquire();

    assert!(service.is_held("/locks/orders/QQ"));
    assert!(service.is_held("/locks/billing/QQ"));
}
