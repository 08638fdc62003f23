//! In-Memory Key-Value Store

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::storage::KeyValueStore;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Key-value store backed by a process-local map.
///
/// Serves as the transparent fallback behind the storage facade when the host
/// bridge is absent, and as the durable store in tests. Contents do not
/// survive process restart.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, for diagnostics and tests.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_missing_key() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.read("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_and_read() {
        let store = MemoryKeyValueStore::new();
        store.save("snap_tasks", "[]").await.unwrap();
        assert_eq!(store.read("snap_tasks").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = MemoryKeyValueStore::new();
        store.save("key", "first").await.unwrap();
        store.save("key", "second").await.unwrap();
        assert_eq!(store.read("key").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryKeyValueStore::new();
        store.save("key", "value").await.unwrap();
        store.delete("key").await.unwrap();
        store.delete("key").await.unwrap();
        assert_eq!(store.read("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_contains() {
        let store = MemoryKeyValueStore::new();
        assert!(!store.contains("key").await.unwrap());
        store.save("key", "value").await.unwrap();
        assert!(store.contains("key").await.unwrap());
    }
}
