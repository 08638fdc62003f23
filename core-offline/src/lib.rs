//! # Offline Operation Module
//!
//! Guarantees that task mutations performed while disconnected are not lost
//! and are eventually applied to the remote store exactly once, in causal
//! order.
//!
//! ## Components
//!
//! - **Offline Operation Queue** (`queue`): durable FIFO of pending write
//!   operations with a single-flight flush, bounded exponential backoff
//!   retry, and idempotent create replay
//! - **Connectivity Monitor** (`connectivity`): observes online/offline
//!   transitions, normalizes the raw bridge event, and triggers a flush on
//!   every reconnect

pub mod connectivity;
pub mod error;
pub mod queue;

pub use connectivity::{
    ConnectivityMonitor, ConnectivityState, CONNECTIVITY_CHANGE, CONNECTIVITY_CHANGED,
};
pub use error::{OfflineError, Result};
pub use queue::{
    FlushOutcome, FlushReport, OfflineOperationQueue, OperationType, QueueConfig, QueuedOperation,
    SYNC_COMPLETED, SYNC_FAILED, SYNC_STATUS,
};
