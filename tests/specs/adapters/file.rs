//! File coordination specs
//!
//! Verify registries pointed at the same lock directory exclude each other
//! through real file locks.

use crate::prelude::*;

fn lock_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

#[test]
fn lock_file_appears_under_registry_path() {
    let dir = lock_dir();
    let process = Process::connected(FileCoordinationClient::new(dir.path()));

    let lock = process.registry.get_lock("A").unwrap();
    let _held = lock.acquire();

    assert_eq!(lock.phase(), LockPhase::LocalAndDistributed);
    assert!(dir.path().join("locks/orders/QQ.lock").exists());
}

#[test]
fn processes_sharing_a_directory_contend() {
    let dir = lock_dir();
    let first = Process::connected(FileCoordinationClient::new(dir.path()));
    let second = Process::connected(FileCoordinationClient::new(dir.path()));

    let held = first.registry.get_lock("A").unwrap();
    held.lock();

    let contender = second.registry.get_lock("A").unwrap();
    assert!(contender.try_lock());
    assert_eq!(contender.phase(), LockPhase::LocalOnly);
    contender.unlock().unwrap();
    held.unlock().unwrap();

    assert!(contender.try_lock());
    assert_eq!(contender.phase(), LockPhase::LocalAndDistributed);
    contender.unlock().unwrap();

    assert_eq!(second.failure_kinds(), vec!["acquire_timed_out"]);
}

#[test]
fn missing_directory_degrades_with_unavailable_report() {
    let dir = lock_dir();
    let process = Process::connected(FileCoordinationClient::new(dir.path().join("gone")));

    let lock = process.registry.get_lock("A").unwrap();
    {
        let _held = lock.acquire();
        assert_eq!(lock.phase(), LockPhase::LocalOnly);
    }

    assert_eq!(process.failure_kinds(), vec!["unavailable"]);
}

#[test]
fn traced_file_client_behaves_the_same() {
    let dir = lock_dir();
    let first = Process::connected(TracedCoordinationClient::new(FileCoordinationClient::new(
        dir.path(),
    )));
    let second = Process::connected(FileCoordinationClient::new(dir.path()));

    let lock = first.registry.get_lock("A").unwrap();
    let _held = lock.acquire();
    assert_eq!(lock.phase(), LockPhase::LocalAndDistributed);

    let contender = second.registry.get_lock("A").unwrap();
    assert!(contender.try_lock());
    assert_eq!(contender.phase(), LockPhase::LocalOnly);
    contender.unlock().unwrap();
}

#[test]
fn idle_lock_files_can_be_pruned_while_held_ones_stay() {
    let dir = lock_dir();
    let client = FileCoordinationClient::new(dir.path());
    let process = Process::connected(client.clone());

    let held = process.registry.get_lock("A").unwrap();
    held.lock();
    let idle = process.registry.get_lock("B").unwrap();
    drop(idle.acquire());

    assert_eq!(client.prune_unlocked().unwrap(), 1);
    assert!(dir.path().join("locks/orders/QQ.lock").exists());

    held.unlock().unwrap();
    assert_eq!(client.prune_unlocked().unwrap(), 1);
}
