//! # Native Call Reconciliation Module
//!
//! Bridges the gap between "fire a native action" and "receive its result
//! via an independent event channel".
//!
//! ## Overview
//!
//! Host modules acknowledge invocations immediately; the real outcome of a
//! camera capture or a permission prompt arrives later as a named bridge
//! event carrying no correlation id. This crate owns everything on that
//! path:
//!
//! - **Native Invoker** (`invoker`): availability-gated, timeout-bounded
//!   invocation with normalized failure classification
//! - **Correlation Waiter** (`waiter`): pending-operation state machine that
//!   resolves the first matching success/failure event, enforces at most one
//!   in-flight operation per kind, and removes its listeners on settlement
//! - **Permission Gate** (`permission`): the permission request sub-protocol
//!   with its canonical boolean decision
//! - **Camera Service** (`capture`): the full capture flow with fallback
//!   executor substitution
//! - **Facades** (`storage`, `navigation`, `remote`): thin adapters over
//!   bridge primitives with transparent local fallbacks

pub mod capture;
pub mod error;
pub mod invoker;
pub mod navigation;
pub mod permission;
pub mod remote;
pub mod storage;
pub mod waiter;

pub use capture::{CameraService, CAMERA_CAPTURE_ERROR, CAMERA_CAPTURE_SUCCESS, PHOTO_CAPTURED};
pub use error::{BridgeCallError, Result};
pub use invoker::NativeInvoker;
pub use navigation::NavigationFacade;
pub use permission::{PermissionGate, PermissionKind};
pub use remote::HostRemoteStore;
pub use storage::StorageFacade;
pub use waiter::{
    CorrelationWaiter, EventMatcher, OperationKind, PendingOperation, Settlement, WaitSpec,
    WaitState,
};
