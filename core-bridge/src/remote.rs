//! # Host Remote Store
//!
//! `RemoteStore` adapter speaking to the host's document-store module. All
//! cloud traffic in the original system goes through the bridge, so this is
//! the production implementation behind the offline queue.

use crate::error::BridgeCallError;
use crate::invoker::NativeInvoker;
use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::remote::RemoteStore;
use bridge_traits::BridgeError;
use serde_json::{json, Value};
use std::sync::Arc;

/// Host module fronting the remote task board.
pub const REMOTE_MODULE: &str = "TaskBoard";

fn to_bridge_error(error: BridgeCallError) -> BridgeError {
    match error {
        BridgeCallError::Unavailable => BridgeError::NotAvailable("remote store".to_string()),
        other => BridgeError::OperationFailed(other.to_string()),
    }
}

pub struct HostRemoteStore {
    invoker: Arc<NativeInvoker>,
}

impl HostRemoteStore {
    pub fn new(invoker: Arc<NativeInvoker>) -> Self {
        Self { invoker }
    }
}

#[async_trait]
impl RemoteStore for HostRemoteStore {
    async fn create(&self, collection: &str, entity_id: &str, data: Value) -> BridgeResult<()> {
        self.invoker
            .invoke(
                REMOTE_MODULE,
                "add",
                json!({ "collection": collection, "id": entity_id, "data": data }),
            )
            .await
            .map_err(to_bridge_error)?;
        Ok(())
    }

    async fn update(&self, collection: &str, entity_id: &str, data: Value) -> BridgeResult<()> {
        self.invoker
            .invoke(
                REMOTE_MODULE,
                "update",
                json!({ "collection": collection, "id": entity_id, "data": data }),
            )
            .await
            .map_err(to_bridge_error)?;
        Ok(())
    }

    async fn delete(&self, collection: &str, entity_id: &str) -> BridgeResult<()> {
        self.invoker
            .invoke(
                REMOTE_MODULE,
                "delete",
                json!({ "collection": collection, "id": entity_id }),
            )
            .await
            .map_err(to_bridge_error)?;
        Ok(())
    }

    async fn exists(&self, collection: &str, entity_id: &str) -> BridgeResult<bool> {
        let value = self
            .invoker
            .invoke(
                REMOTE_MODULE,
                "exists",
                json!({ "collection": collection, "id": entity_id }),
            )
            .await
            .map_err(to_bridge_error)?;

        Ok(value.get("exists").and_then(Value::as_bool).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_local::ScriptedBridge;
    use std::time::Duration;

    fn store(bridge: Arc<ScriptedBridge>) -> HostRemoteStore {
        HostRemoteStore::new(Arc::new(NativeInvoker::new(
            bridge,
            Duration::from_millis(200),
        )))
    }

    #[tokio::test]
    async fn test_create_routes_through_host() {
        let bridge = Arc::new(ScriptedBridge::new());
        let store = store(Arc::clone(&bridge));

        store
            .create("UserTasks", "task-1", json!({ "title": "Buy milk" }))
            .await
            .unwrap();

        let calls = bridge.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].module, REMOTE_MODULE);
        assert_eq!(calls[0].action, "add");
        assert_eq!(calls[0].params["collection"], "UserTasks");
        assert_eq!(calls[0].params["id"], "task-1");
    }

    #[tokio::test]
    async fn test_exists_parses_flag() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.respond(REMOTE_MODULE, "exists", json!({ "exists": true }));

        assert!(store(Arc::clone(&bridge)).exists("UserTasks", "task-1").await.unwrap());

        bridge.respond(REMOTE_MODULE, "exists", json!({}));
        assert!(!store(bridge).exists("UserTasks", "task-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_failure_surfaces_as_bridge_error() {
        let bridge = Arc::new(ScriptedBridge::new());
        bridge.fail(REMOTE_MODULE, "delete", "backend unreachable");

        let error = store(bridge).delete("UserTasks", "task-1").await.unwrap_err();
        assert!(error.to_string().contains("backend unreachable"));
    }
}
