//! Connectivity Detection Abstraction
//!
//! Continuous connectivity changes reach the core as `CONNECTIVITY_CHANGE`
//! bridge events; this trait only covers the initial probe at startup, before
//! the first event has arrived.

use async_trait::async_trait;

/// One-shot connectivity probe.
///
/// # Platform Support
///
/// - **Native shell**: asks the host connectivity module
/// - **Web**: `navigator.onLine`
/// - **Tests**: fixed value (`bridge_local::StaticConnectivityProbe`)
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Best-effort check whether the device currently has connectivity.
    ///
    /// Implementations should lean optimistic: a wrong `true` costs one
    /// failed flush pass, a wrong `false` silently parks the queue.
    async fn is_online(&self) -> bool;
}
