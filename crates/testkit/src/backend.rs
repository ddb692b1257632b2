//! Storage doubles.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use cropcraft_crops::{MemoryBackend, StorageBackend};

/// In-memory backend that fails on demand.
///
/// Failures can be switched on for whole operation kinds or for individual
/// keys, so one chunk can fail while its neighbours save normally.
#[derive(Debug, Default)]
pub struct FailingBackend {
    inner: MemoryBackend,
    fail_saves: AtomicBool,
    fail_loads: AtomicBool,
    fail_deletes: AtomicBool,
    failing_keys: Mutex<BTreeSet<String>>,
    save_attempts: AtomicUsize,
}

impl FailingBackend {
    /// Backend that succeeds until told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every save fail (or succeed again).
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make every load fail.
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Make every delete fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make every operation on `key` fail.
    pub fn fail_key(&self, key: &str) {
        if let Ok(mut keys) = self.failing_keys.lock() {
            keys.insert(key.to_string());
        }
    }

    /// Saves attempted, including failed ones.
    pub fn save_attempts(&self) -> usize {
        self.save_attempts.load(Ordering::SeqCst)
    }

    /// The underlying store.
    pub fn inner(&self) -> &MemoryBackend {
        &self.inner
    }

    fn check(&self, switch: &AtomicBool, op: &str, key: &str) -> Result<()> {
        let key_fails = self
            .failing_keys
            .lock()
            .map(|keys| keys.contains(key))
            .unwrap_or(true);
        if switch.load(Ordering::SeqCst) || key_fails {
            bail!("injected {op} failure for {key}");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FailingBackend {
    async fn save(&self, key: &str, value: &str) -> Result<()> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_saves, "save", key)?;
        self.inner.save(key, value).await
    }

    async fn load(&self, key: &str) -> Result<Option<String>> {
        self.check(&self.fail_loads, "load", key)?;
        self.inner.load(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check(&self.fail_deletes, "delete", key)?;
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.check(&self.fail_loads, "exists", key)?;
        self.inner.exists(key).await
    }
}
