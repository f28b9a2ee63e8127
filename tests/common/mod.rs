//! Shared helpers for Marginalia integration tests

use marginalia::{LocalStore, MemoryStore, StorageError, StorageResult};
use std::sync::Mutex;
use std::time::Duration;

/// A store that records every write it receives
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    writes: Mutex<Vec<(String, String)>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes so far, oldest first
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn writes_to(&self, key: &str) -> Vec<String> {
        self.writes()
            .into_iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }
}

impl LocalStore for RecordingStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        self.inner.remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.inner.keys_with_prefix(prefix)
    }
}

/// A store whose every operation fails
pub struct UnavailableStore;

impl LocalStore for UnavailableStore {
    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn remove(&self, _key: &str) -> StorageResult<bool> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn keys_with_prefix(&self, _prefix: &str) -> StorageResult<Vec<String>> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }
}

/// Let anything that is due run; used before asserting nothing happened
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Drive the runtime until `done` holds or a generous bound passes.
///
/// Debounced writes finish on tokio's blocking pool, so the pool thread
/// gets real time between checks.
pub async fn wait_until(done: impl Fn() -> bool) -> bool {
    for _ in 0..2000 {
        if done() {
            return true;
        }
        tokio::task::yield_now().await;
        std::thread::sleep(Duration::from_millis(1));
    }
    done()
}
