//! # Storage Facade
//!
//! Key-value storage over the host storage module with a transparent local
//! fallback. Callers cannot observe which backend served a request.

use crate::error::BridgeCallError;
use crate::invoker::NativeInvoker;
use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::storage::KeyValueStore;
use bridge_traits::BridgeError;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// Host module providing persistent storage.
pub const STORAGE_MODULE: &str = "Storage";

fn to_bridge_error(error: BridgeCallError) -> BridgeError {
    match error {
        BridgeCallError::Unavailable => {
            BridgeError::NotAvailable("host storage".to_string())
        }
        other => BridgeError::Storage(other.to_string()),
    }
}

/// Key-value store backed by the host storage module.
pub struct HostKeyValueStore {
    invoker: Arc<NativeInvoker>,
}

impl HostKeyValueStore {
    pub fn new(invoker: Arc<NativeInvoker>) -> Self {
        Self { invoker }
    }
}

#[async_trait]
impl KeyValueStore for HostKeyValueStore {
    async fn read(&self, key: &str) -> BridgeResult<Option<String>> {
        let value = self
            .invoker
            .invoke(STORAGE_MODULE, "read", json!({ "key": key }))
            .await
            .map_err(to_bridge_error)?;

        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn save(&self, key: &str, value: &str) -> BridgeResult<()> {
        self.invoker
            .invoke(STORAGE_MODULE, "save", json!({ "key": key, "value": value }))
            .await
            .map_err(to_bridge_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.invoker
            .invoke(STORAGE_MODULE, "delete", json!({ "key": key }))
            .await
            .map_err(to_bridge_error)?;
        Ok(())
    }
}

/// Storage facade consulted by every durable surface in the core.
///
/// Prefers the host store while the bridge is present; any host failure
/// degrades to the injected local store with a warning, and the caller never
/// learns which backend answered.
pub struct StorageFacade {
    host: HostKeyValueStore,
    local: Arc<dyn KeyValueStore>,
    invoker: Arc<NativeInvoker>,
}

impl StorageFacade {
    pub fn new(invoker: Arc<NativeInvoker>, local: Arc<dyn KeyValueStore>) -> Self {
        Self {
            host: HostKeyValueStore::new(Arc::clone(&invoker)),
            local,
            invoker,
        }
    }
}

#[async_trait]
impl KeyValueStore for StorageFacade {
    async fn read(&self, key: &str) -> BridgeResult<Option<String>> {
        if self.invoker.is_available() {
            match self.host.read(key).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    warn!(key = %key, error = %error, "Host storage read failed, using local store");
                }
            }
        }
        self.local.read(key).await
    }

    async fn save(&self, key: &str, value: &str) -> BridgeResult<()> {
        if self.invoker.is_available() {
            match self.host.save(key, value).await {
                Ok(()) => return Ok(()),
                Err(error) => {
                    warn!(key = %key, error = %error, "Host storage save failed, using local store");
                }
            }
        }
        self.local.save(key, value).await
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        if self.invoker.is_available() {
            match self.host.delete(key).await {
                Ok(()) => return Ok(()),
                Err(error) => {
                    warn!(key = %key, error = %error, "Host storage delete failed, using local store");
                }
            }
        }
        self.local.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_local::{MemoryKeyValueStore, ScriptedBridge};
    use std::time::Duration;

    fn facade(bridge: Arc<ScriptedBridge>) -> StorageFacade {
        let invoker = Arc::new(NativeInvoker::new(bridge, Duration::from_millis(200)));
        StorageFacade::new(invoker, Arc::new(MemoryKeyValueStore::new()))
    }

    #[tokio::test]
    async fn test_reads_through_host_when_available() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.respond(STORAGE_MODULE, "read", json!("[{\"id\":\"1\"}]"));

        let facade = facade(Arc::clone(&bridge));
        let value = facade.read("snap_tasks").await.unwrap();

        assert_eq!(value.as_deref(), Some("[{\"id\":\"1\"}]"));
        assert_eq!(bridge.call_count(STORAGE_MODULE, "read"), 1);
    }

    #[tokio::test]
    async fn test_null_read_is_none() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.respond(STORAGE_MODULE, "read", Value::Null);

        let facade = facade(bridge);
        assert_eq!(facade.read("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_falls_back_to_local_when_bridge_absent() {
        let bridge = Arc::new(ScriptedBridge::absent());
        let facade = facade(Arc::clone(&bridge));

        facade.save("snap_tasks", "[]").await.unwrap();
        assert_eq!(facade.read("snap_tasks").await.unwrap().as_deref(), Some("[]"));
        // The host module was never consulted.
        assert_eq!(bridge.call_count(STORAGE_MODULE, "save"), 0);
        assert_eq!(bridge.call_count(STORAGE_MODULE, "read"), 0);
    }

    #[tokio::test]
    async fn test_host_failure_degrades_to_local() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.fail(STORAGE_MODULE, "save", "disk full");
        bridge.fail(STORAGE_MODULE, "read", "disk full");

        let facade = facade(bridge);
        facade.save("last_photo", "{\"uri\":\"file://a.jpg\"}").await.unwrap();

        // The value landed in the local store and is served from there.
        assert_eq!(
            facade.read("last_photo").await.unwrap().as_deref(),
            Some("{\"uri\":\"file://a.jpg\"}")
        );
    }
}
