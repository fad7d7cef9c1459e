//! Durable key-value persistence port.
//!
//! Sessions, the unsynced transcript queue and the bound inquiry id all go
//! through this minimal `get`/`set`/`remove` seam so the engine stays
//! agnostic of the platform storage underneath (browser local storage in the
//! widget host, a JSON directory here, memory in tests).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{VestaError, VestaResult};

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> VestaResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> VestaResult<()>;

    async fn remove(&self, key: &str) -> VestaResult<()>;
}

/// In-memory store. The default for tests and for hosts that handle
/// persistence themselves.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> VestaResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| VestaError::storage_read(key, "store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> VestaResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| VestaError::storage_write(key, "store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> VestaResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| VestaError::storage_write(key, "store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// File-per-key JSON store rooted at a data directory.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the platform data directory.
    pub fn in_data_dir(app_name: &str) -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join(app_name))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are internal identifiers; anything outside [a-z0-9_-] is
        // replaced so a key can never escape the root directory.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> VestaResult<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(VestaError::storage_read(key, err.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> VestaResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| VestaError::storage_write(key, err.to_string()))?;
        let path = self.path_for(key);
        debug!(key, path = %path.display(), "writing store entry");
        tokio::fs::write(&path, value)
            .await
            .map_err(|err| VestaError::storage_write(key, err.to_string()))
    }

    async fn remove(&self, key: &str) -> VestaResult<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(VestaError::storage_write(key, err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);

        store.set("bound_inquiry_id", "inq_1").await.unwrap();
        assert_eq!(
            store.get("bound_inquiry_id").await.unwrap(),
            Some("inq_1".to_string())
        );

        store.remove("bound_inquiry_id").await.unwrap();
        assert_eq!(store.get("bound_inquiry_id").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert_eq!(store.get("chat_sessions").await.unwrap(), None);

        store.set("chat_sessions", "[]").await.unwrap();
        assert_eq!(
            store.get("chat_sessions").await.unwrap(),
            Some("[]".to_string())
        );

        store.remove("chat_sessions").await.unwrap();
        assert_eq!(store.get("chat_sessions").await.unwrap(), None);

        // Removing a missing key is not an error.
        store.remove("chat_sessions").await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.set("../escape", "x").await.unwrap();
        assert_eq!(store.get("../escape").await.unwrap(), Some("x".to_string()));
        assert!(!dir.path().parent().unwrap().join("escape.json").exists());
    }
}
