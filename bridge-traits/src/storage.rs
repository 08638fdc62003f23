//! Local Persistence Abstraction
//!
//! Key-value storage for the task cache, the offline operation queue, and
//! last-capture bookkeeping. Values are opaque strings; the core stores JSON
//! documents in them.

use async_trait::async_trait;

use crate::error::Result;

/// Key-value storage trait.
///
/// Abstracts the host's persistent storage:
/// - **Native shell**: the bridge storage module (encrypted store on device)
/// - **Web**: `localStorage`
/// - **Tests**: in-memory map (`bridge_local::MemoryKeyValueStore`)
///
/// Callers treat the store as durable but best-effort: a failed write is
/// logged and the operation continues with in-memory state where possible.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// async fn cache_tasks(store: &dyn KeyValueStore, json: &str) -> Result<()> {
///     store.save("snap_tasks", json).await
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key has never been written.
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, overwriting any previous value.
    async fn save(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` and its value.
    ///
    /// Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check for a key without reading its value.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.read(key).await?.is_some())
    }
}
