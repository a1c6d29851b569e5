//! Reusable test helpers for the social core integration tests.
//!
//! Each test builds its own [`SocialCore`] over a fresh database and records
//! notifications in a [`MemoryNotifier`], so assertions can inspect exactly
//! which events a workflow emitted.

#![allow(dead_code)]

use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use social_core::notify::MemoryNotifier;
use social_core::{EngineConfig, SocialCore, UserId};

/// Atomic counter for unique test directory names.
static HELPER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Creates a unique temporary directory for test isolation.
///
/// Each call produces a distinct path by combining the prefix, process ID,
/// and an atomic counter.
pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    let id = HELPER_COUNTER.fetch_add(1, Ordering::SeqCst);
    env::temp_dir().join(format!(
        "social_core_test_{}_{}_{}",
        prefix,
        std::process::id(),
        id
    ))
}

/// Removes a temporary test directory. Ignores errors silently.
pub fn cleanup_dir(dir: &PathBuf) {
    let _ = std::fs::remove_dir_all(dir);
}

/// Routes `tracing` output through the test harness.
///
/// Set `RUST_LOG=social_core=debug` to see workflow logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A core instance plus the notifier recording its events.
pub struct TestCore {
    pub core: SocialCore,
    pub notifier: Arc<MemoryNotifier>,
}

impl TestCore {
    /// Builds a core over an in-memory database.
    pub fn in_memory() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Builds a core over an in-memory database with custom settings.
    pub fn with_config(config: EngineConfig) -> Self {
        init_tracing();
        let notifier = Arc::new(MemoryNotifier::new());
        let core = SocialCore::open_in_memory(config, notifier.clone())
            .expect("should open in-memory core");
        Self { core, notifier }
    }

    /// Registers one user per name and returns their ids in order.
    pub fn users(&self, names: &[&str]) -> Vec<UserId> {
        names
            .iter()
            .map(|name| {
                self.core
                    .users()
                    .create_user(name, None, None)
                    .expect("should create user")
                    .id
            })
            .collect()
    }

    /// Makes `a` and `b` friends through a request and acceptance.
    pub fn befriend(&self, a: UserId, b: UserId) {
        let request = self
            .core
            .relationships()
            .send_request(a, b)
            .expect("should send request");
        self.core
            .relationships()
            .accept(request.id)
            .expect("should accept request");
    }

    /// Discards every recorded notification.
    pub fn clear_events(&self) {
        let _ = self.notifier.drain();
    }
}
