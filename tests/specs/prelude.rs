//! Shared helpers for behavioral specs

pub use ilock_adapters::{
    FakeCoordinationClient, FakeMode, FileCoordinationClient, TracedCoordinationClient,
};
pub use ilock_core::coordination::{FailureRecord, RecordingObserver};
pub use ilock_core::{
    synchronized, BestEffortLockRegistry, CancelToken, CoordinationClient, LockPhase,
    LockRegistry, ReentrantLock, RegistryConfig, RegistryName, StringKeyFactory, SyncError,
};
pub use std::sync::Arc;
pub use std::thread;
pub use std::time::Duration;

pub type Registry = BestEffortLockRegistry<str, StringKeyFactory>;

/// Distributed attempts in specs give up quickly
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_millis(100);

pub fn config() -> RegistryConfig {
    RegistryConfig::new("/locks", RegistryName::new("orders").unwrap())
        .with_acquire_timeout(ACQUIRE_TIMEOUT)
}

/// One simulated process: a registry plus a record of what it swallowed
pub struct Process {
    pub registry: Arc<Registry>,
    pub observer: RecordingObserver,
}

impl Process {
    /// A process talking to `client`
    pub fn connected(client: impl CoordinationClient + 'static) -> Self {
        Self::build(&config(), Some(Arc::new(client)))
    }

    /// A process started without any coordination client
    pub fn degraded() -> Self {
        Self::build(&config(), None)
    }

    pub fn with_config(config: &RegistryConfig, client: impl CoordinationClient + 'static) -> Self {
        Self::build(config, Some(Arc::new(client)))
    }

    fn build(config: &RegistryConfig, client: Option<Arc<dyn CoordinationClient>>) -> Self {
        let observer = RecordingObserver::new();
        let registry = BestEffortLockRegistry::new(config, StringKeyFactory, client)
            .unwrap()
            .with_observer(Arc::new(observer.clone()));
        Self {
            registry: Arc::new(registry),
            observer,
        }
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        self.observer.failures()
    }

    pub fn failure_kinds(&self) -> Vec<&'static str> {
        self.failures().into_iter().map(|f| f.kind).collect()
    }
}
