//! Key/value storage backends for chunk saves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Abstract string key/value store.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write `value` under `key`, replacing any previous value.
    async fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Read the value under `key`; `None` when absent.
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Remove `key`, returning whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Whether `key` holds a value.
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// In-process store, mostly for tests and tools.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |entries| entries.len())
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.lock()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory backend lock poisoned"))
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn save(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(key))
    }
}

/// One JSON file per key under a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write never leaves a truncated save behind.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create save directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Directory holding the save files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            anyhow::bail!("Invalid storage key {key:?}");
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn save(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to move save into {}", path.display()))?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to stat {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_roundtrip() {
        let backend = MemoryBackend::new();
        assert!(backend.is_empty());
        assert_eq!(backend.load("k").await.unwrap(), None);

        backend.save("k", "v1").await.unwrap();
        backend.save("k", "v2").await.unwrap();
        assert_eq!(backend.load("k").await.unwrap().as_deref(), Some("v2"));
        assert!(backend.exists("k").await.unwrap());
        assert_eq!(backend.keys(), vec!["k".to_string()]);

        assert!(backend.delete("k").await.unwrap());
        assert!(!backend.delete("k").await.unwrap());
        assert!(!backend.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn file_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("saves")).unwrap();

        assert_eq!(backend.load("chunk_oats_0_0").await.unwrap(), None);
        backend.save("chunk_oats_0_0", "{}").await.unwrap();
        assert!(backend.dir().join("chunk_oats_0_0.json").exists());
        assert_eq!(
            backend.load("chunk_oats_0_0").await.unwrap().as_deref(),
            Some("{}")
        );
        assert!(backend.exists("chunk_oats_0_0").await.unwrap());
        assert!(backend.delete("chunk_oats_0_0").await.unwrap());
        assert!(!backend.delete("chunk_oats_0_0").await.unwrap());
        assert!(!backend.exists("chunk_oats_0_0").await.unwrap());
    }

    #[tokio::test]
    async fn file_backend_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();
        assert!(backend.save("../escape", "x").await.is_err());
        assert!(backend.save("a/b", "x").await.is_err());
        assert!(backend.load("").await.is_err());
        assert!(backend.save("chunk_oats_-1_-2", "x").await.is_ok());
    }
}
