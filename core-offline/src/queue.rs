//! # Offline Operation Queue
//!
//! Durable FIFO of pending task mutations, replayed against the remote
//! store when connectivity allows.
//!
//! ## Overview
//!
//! Every task mutation is enqueued here; `flush` applies queued operations
//! in enqueue order so causal consistency per entity id is preserved.
//! The queue persists as a JSON array under a storage key and is re-written
//! after every successful application, so a crash mid-flush never replays
//! applied prefix entries.
//!
//! ## Features
//!
//! - **Single-flight flush**: concurrent `flush` calls coalesce into the
//!   in-progress pass
//! - **Bounded exponential backoff**: on failure a retry is scheduled with a
//!   doubling, capped delay; any fully successful flush resets the sequence
//! - **Cancellable retries**: `dispose` aborts pending retry timers on
//!   teardown
//! - **Idempotent replay**: a `create` whose entity already exists remotely
//!   (partial prior flush) is skipped, not duplicated
//! - **Delete invalidation**: enqueueing a `delete` drops earlier queued
//!   operations for the same entity
//!
//! ## Usage
//!
//! ```ignore
//! let queue = OfflineOperationQueue::new(config, store, remote, state, bus);
//! queue.enqueue(QueuedOperation::create("task-1", payload, clock.as_ref())).await?;
//! queue.flush().await?; // no-op while offline
//! ```

use crate::connectivity::ConnectivityState;
use crate::error::{OfflineError, Result};
use bridge_traits::remote::RemoteStore;
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::Clock;
use core_runtime::config::BackoffConfig;
use core_runtime::events::EventBus;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sync lifecycle event: a flush pass started.
pub const SYNC_STATUS: &str = "SYNC_STATUS";

/// Sync lifecycle event: a flush pass applied the whole queue.
pub const SYNC_COMPLETED: &str = "SYNC_COMPLETED";

/// Sync lifecycle event: a flush pass stopped on a failure.
pub const SYNC_FAILED: &str = "SYNC_FAILED";

/// Default storage key the queue persists under.
pub const DEFAULT_QUEUE_KEY: &str = "offline_op_queue";

/// Kind of write operation a queue entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl FromStr for OperationType {
    type Err = OfflineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(OfflineError::Storage(format!("Invalid operation type: {}", s))),
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One durable queue entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueuedOperation {
    /// Unique identifier of the queue entry
    pub id: String,
    /// Kind of write operation
    pub op: OperationType,
    /// Entity type the operation targets
    #[serde(default = "default_entity")]
    pub entity: String,
    /// Entity id the operation targets
    pub entity_id: String,
    /// Document payload; empty object for deletes
    pub payload: Value,
    /// Unix timestamp when enqueued
    pub enqueued_at: i64,
    /// Number of failed application attempts
    pub attempts: u32,
}

fn default_entity() -> String {
    "Task".to_string()
}

impl QueuedOperation {
    pub fn new(
        op: OperationType,
        entity_id: impl Into<String>,
        payload: Value,
        clock: &dyn Clock,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            op,
            entity: default_entity(),
            entity_id: entity_id.into(),
            payload,
            enqueued_at: clock.unix_timestamp(),
            attempts: 0,
        }
    }

    pub fn create(entity_id: impl Into<String>, payload: Value, clock: &dyn Clock) -> Self {
        Self::new(OperationType::Create, entity_id, payload, clock)
    }

    pub fn update(entity_id: impl Into<String>, payload: Value, clock: &dyn Clock) -> Self {
        Self::new(OperationType::Update, entity_id, payload, clock)
    }

    pub fn delete(entity_id: impl Into<String>, clock: &dyn Clock) -> Self {
        Self::new(OperationType::Delete, entity_id, json!({}), clock)
    }
}

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Storage key the queue persists under
    pub storage_key: String,
    /// Remote collection operations are applied to
    pub collection: String,
    /// Retry backoff tuning
    pub backoff: BackoffConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_QUEUE_KEY.to_string(),
            collection: "UserTasks".to_string(),
            backoff: BackoffConfig::default(),
        }
    }
}

/// Counters for one flush pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushReport {
    /// Operations applied remotely
    pub applied: usize,
    /// Operations skipped as already applied (idempotent replay)
    pub skipped: usize,
    /// Operations left in the queue
    pub remaining: usize,
}

/// Outcome of a `flush` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The whole queue was applied; the queue is now empty.
    Completed(FlushReport),
    /// A failure stopped the pass; the remainder is preserved in order and
    /// a retry is scheduled.
    Failed(FlushReport),
    /// Connectivity is down; nothing was attempted.
    Offline,
    /// Another flush pass is in progress; this call coalesced into it.
    AlreadyRunning,
}

struct Inner {
    config: QueueConfig,
    store: Arc<dyn KeyValueStore>,
    remote: Arc<dyn RemoteStore>,
    connectivity: ConnectivityState,
    bus: EventBus,
    flush_in_progress: AtomicBool,
    consecutive_failures: AtomicU32,
    retry_scheduled: AtomicBool,
    cancel: CancellationToken,
}

/// Durable offline operation queue.
///
/// Cheap to clone; clones share the same durable queue and flush state.
#[derive(Clone)]
pub struct OfflineOperationQueue {
    inner: Arc<Inner>,
}

impl OfflineOperationQueue {
    pub fn new(
        config: QueueConfig,
        store: Arc<dyn KeyValueStore>,
        remote: Arc<dyn RemoteStore>,
        connectivity: ConnectivityState,
        bus: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                remote,
                connectivity,
                bus,
                flush_in_progress: AtomicBool::new(false),
                consecutive_failures: AtomicU32::new(0),
                retry_scheduled: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Append an operation to the durable queue.
    ///
    /// Never touches the network. Enqueueing a delete first drops earlier
    /// queued operations for the same entity; a create from a prior partial
    /// flush may already be remote, so the delete itself is kept.
    pub async fn enqueue(&self, op: QueuedOperation) -> Result<()> {
        let mut queue = self.load().await?;

        if op.op == OperationType::Delete {
            let before = queue.len();
            queue.retain(|entry| entry.entity_id != op.entity_id);
            if queue.len() != before {
                debug!(
                    entity_id = %op.entity_id,
                    dropped = before - queue.len(),
                    "Invalidated queued operations superseded by delete"
                );
            }
        }

        info!(op = %op.op, entity_id = %op.entity_id, "Enqueuing offline operation");
        queue.push(op);
        self.persist(&queue).await
    }

    /// Drop every queued operation referencing `entity_id`.
    pub async fn invalidate(&self, entity_id: &str) -> Result<usize> {
        let mut queue = self.load().await?;
        let before = queue.len();
        queue.retain(|entry| entry.entity_id != entity_id);
        let dropped = before - queue.len();
        if dropped > 0 {
            self.persist(&queue).await?;
        }
        Ok(dropped)
    }

    /// Snapshot of the queued operations, oldest first.
    pub async fn pending(&self) -> Result<Vec<QueuedOperation>> {
        self.load().await
    }

    /// Number of queued operations.
    pub async fn len(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.load().await?.is_empty())
    }

    /// Apply the queue to the remote store in FIFO order.
    ///
    /// No-op while offline or while another pass is running (single-flight;
    /// concurrent calls coalesce). On the first failure the pass stops, the
    /// remainder is preserved in order, and a retry is scheduled with
    /// exponential backoff. A fully successful pass clears the queue and
    /// resets the backoff.
    pub async fn flush(&self) -> Result<FlushOutcome> {
        if !self.inner.connectivity.is_online() {
            debug!("Flush skipped, offline");
            return Ok(FlushOutcome::Offline);
        }

        if self.inner.flush_in_progress.swap(true, Ordering::SeqCst) {
            debug!("Flush already in progress, coalescing");
            return Ok(FlushOutcome::AlreadyRunning);
        }

        let outcome = self.run_flush().await;
        self.inner.flush_in_progress.store(false, Ordering::SeqCst);

        match &outcome {
            Ok(FlushOutcome::Completed(report)) => {
                self.inner.consecutive_failures.store(0, Ordering::SeqCst);
                if report.applied + report.skipped > 0 {
                    info!(
                        applied = report.applied,
                        skipped = report.skipped,
                        "Offline queue flushed"
                    );
                }
            }
            Ok(FlushOutcome::Failed(report)) => {
                warn!(remaining = report.remaining, "Flush stopped on failure, retry scheduled");
                self.schedule_retry();
            }
            _ => {}
        }

        outcome
    }

    /// Cancel pending retry timers. Call on teardown.
    pub fn dispose(&self) {
        self.inner.cancel.cancel();
    }

    async fn run_flush(&self) -> Result<FlushOutcome> {
        let mut queue = self.load().await?;
        if queue.is_empty() {
            return Ok(FlushOutcome::Completed(FlushReport::default()));
        }

        self.inner.bus.emit(SYNC_STATUS, json!({ "state": "SYNCING" }));
        info!(pending = queue.len(), "Flushing offline operation queue");

        let mut report = FlushReport::default();

        while let Some(op) = queue.first().cloned() {
            match self.apply(&op).await {
                Ok(applied) => {
                    if applied {
                        report.applied += 1;
                    } else {
                        debug!(op = %op.op, entity_id = %op.entity_id, "Skipping already-applied operation");
                        report.skipped += 1;
                    }
                    queue.remove(0);
                    // Persist after every application so a crash mid-pass
                    // never replays the applied prefix.
                    self.persist(&queue).await?;
                }
                Err(error) => {
                    queue[0].attempts += 1;
                    self.persist(&queue).await?;
                    self.inner.consecutive_failures.fetch_add(1, Ordering::SeqCst);
                    report.remaining = queue.len();

                    warn!(
                        op = %op.op,
                        entity_id = %op.entity_id,
                        attempts = queue[0].attempts,
                        error = %error,
                        "Remote application failed, preserving remaining queue"
                    );
                    self.inner
                        .bus
                        .emit(SYNC_FAILED, json!({ "message": error.to_string() }));
                    return Ok(FlushOutcome::Failed(report));
                }
            }
        }

        self.inner.bus.emit(
            SYNC_COMPLETED,
            json!({ "count": report.applied + report.skipped }),
        );
        Ok(FlushOutcome::Completed(report))
    }

    async fn apply(&self, op: &QueuedOperation) -> Result<bool> {
        let collection = self.inner.config.collection.as_str();
        let remote = &self.inner.remote;
        match op.op {
            OperationType::Create => {
                let exists = remote
                    .exists(collection, &op.entity_id)
                    .await
                    .map_err(|e| OfflineError::RemoteFlush(e.to_string()))?;
                if exists {
                    return Ok(false);
                }
                remote
                    .create(collection, &op.entity_id, op.payload.clone())
                    .await
                    .map_err(|e| OfflineError::RemoteFlush(e.to_string()))?;
                Ok(true)
            }
            OperationType::Update => {
                remote
                    .update(collection, &op.entity_id, op.payload.clone())
                    .await
                    .map_err(|e| OfflineError::RemoteFlush(e.to_string()))?;
                Ok(true)
            }
            OperationType::Delete => {
                remote
                    .delete(collection, &op.entity_id)
                    .await
                    .map_err(|e| OfflineError::RemoteFlush(e.to_string()))?;
                Ok(true)
            }
        }
    }

    fn schedule_retry(&self) {
        if self.inner.retry_scheduled.swap(true, Ordering::SeqCst) {
            return;
        }

        let attempt = self
            .inner
            .consecutive_failures
            .load(Ordering::SeqCst)
            .saturating_sub(1);
        let delay = self.inner.config.backoff.delay_for(attempt);
        info!(delay_ms = delay.as_millis() as u64, attempt, "Scheduling flush retry");

        let queue = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = queue.inner.cancel.cancelled() => {
                    debug!("Flush retry cancelled");
                    queue.inner.retry_scheduled.store(false, Ordering::SeqCst);
                }
                _ = tokio::time::sleep(delay) => {
                    queue.inner.retry_scheduled.store(false, Ordering::SeqCst);
                    let _ = queue.flush().await;
                }
            }
        });
    }

    async fn load(&self) -> Result<Vec<QueuedOperation>> {
        let raw = self
            .inner
            .store
            .read(&self.inner.config.storage_key)
            .await
            .map_err(|e| OfflineError::Storage(e.to_string()))?;

        match raw {
            None => Ok(Vec::new()),
            Some(json) => match serde_json::from_str(&json) {
                Ok(queue) => Ok(queue),
                Err(error) => {
                    warn!(error = %error, "Queue storage corrupt, starting empty");
                    Ok(Vec::new())
                }
            },
        }
    }

    async fn persist(&self, queue: &[QueuedOperation]) -> Result<()> {
        let json = serde_json::to_string(queue)?;
        self.inner
            .store
            .save(&self.inner.config.storage_key, &json)
            .await
            .map_err(|e| OfflineError::Storage(e.to_string()))
    }
}

impl std::fmt::Debug for OfflineOperationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineOperationQueue")
            .field("storage_key", &self.inner.config.storage_key)
            .field("collection", &self.inner.config.collection)
            .finish()
    }
}
