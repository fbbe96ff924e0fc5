//! Synchronized wrapper specs
//!
//! Verify closures run under the keyed lock, honour the configured lock
//! timeout, and release on panic.

use crate::prelude::*;
use ilock_core::{synchronized_interruptibly, LockError, Synchronizer};
use std::io::Write;
use std::sync::mpsc;

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn config_file_drives_registry_timeout() {
    let file = config_file(
        r#"
root_path = "/locks"
name = "orders"
acquire_timeout = "50ms"
lock_timeout = "80ms"
"#,
    );
    let config = RegistryConfig::load(file.path()).unwrap();
    let process = Process::with_config(&config, FakeCoordinationClient::new());

    let (held_tx, held_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let registry = Arc::clone(&process.registry);
    let holder = thread::spawn(move || {
        synchronized(registry.as_ref(), "A", || {
            held_tx.send(()).unwrap();
            let _ = done_rx.recv();
        })
        .unwrap();
    });
    held_rx.recv().unwrap();

    let result = synchronized(process.registry.as_ref(), "A", || ());
    assert!(matches!(
        result,
        Err(SyncError::TimedOut(t)) if t == Duration::from_millis(80)
    ));

    drop(done_tx);
    holder.join().unwrap();
}

#[test]
fn closure_result_is_returned() {
    let process = Process::connected(FakeCoordinationClient::new());
    let value = synchronized(process.registry.as_ref(), "A", || 42).unwrap();
    assert_eq!(value, 42);
}

#[test]
fn panic_inside_closure_releases_both_layers() {
    let service = FakeCoordinationClient::new();
    let process = Process::connected(service.clone());

    let registry = Arc::clone(&process.registry);
    let result = thread::spawn(move || {
        synchronized(registry.as_ref(), "A", || panic!("handler failed")).unwrap();
    })
    .join();

    assert!(result.is_err());
    assert!(!service.is_held("/locks/orders/QQ"));
    assert!(!process.registry.get_lock("A").unwrap().is_locked());
}

#[test]
fn cancelled_wait_reports_interruption() {
    let process = Process::connected(FakeCoordinationClient::new());
    let lock = process.registry.get_lock("A").unwrap();
    let _held = lock.acquire();

    let registry = Arc::clone(&process.registry);
    let result = thread::spawn(move || {
        let cancel = CancelToken::new();
        cancel.cancel();
        synchronized_interruptibly(registry.as_ref(), "A", &cancel, || ())
    })
    .join()
    .unwrap();

    assert!(matches!(result, Err(SyncError::Lock(LockError::Interrupted))));
}

struct Payment {
    account: String,
    cents: u64,
}

#[test]
fn synchronizer_derives_key_from_arguments() {
    let service = FakeCoordinationClient::new();
    let process = Process::connected(service.clone());
    let sync = Synchronizer::new(Arc::clone(&process.registry), |p: &Payment| {
        p.account.as_str()
    });

    let payment = Payment {
        account: "A".to_string(),
        cents: 1250,
    };
    let seen = sync
        .call(&payment, |p| (p.cents, service.is_held("/locks/orders/QQ")))
        .unwrap();

    assert_eq!(seen, (1250, true));
    assert!(!service.is_held("/locks/orders/QQ"));
}
