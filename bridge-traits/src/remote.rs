//! Remote Document Store Abstraction
//!
//! The remote side of the offline queue: task documents applied to the
//! host's cloud store when connectivity allows.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Remote document store trait.
///
/// Consumed exclusively by the offline operation queue during flush. The
/// concrete production implementation speaks to the host bridge's document
/// store module; tests substitute an in-memory recording store.
///
/// # Idempotence requirements
///
/// - `delete` of an entity that does not exist remotely must succeed; a
///   replayed delete after a partial flush would otherwise wedge the queue.
/// - `exists` lets the queue skip replaying a `create` whose entity already
///   reached the store in a previous partial flush.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create a document under `collection` with the given entity id.
    async fn create(&self, collection: &str, entity_id: &str, data: Value) -> Result<()>;

    /// Overwrite the document with the given entity id.
    async fn update(&self, collection: &str, entity_id: &str, data: Value) -> Result<()>;

    /// Remove the document with the given entity id.
    async fn delete(&self, collection: &str, entity_id: &str) -> Result<()>;

    /// Check whether a document with the given entity id exists.
    async fn exists(&self, collection: &str, entity_id: &str) -> Result<bool>;
}
