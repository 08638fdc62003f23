//! Host Bridge Invocation Surface
//!
//! The host runtime exposes native modules addressable by name. A call is a
//! `(module, action, params)` triple; the module acknowledges receipt with a
//! JSON value, and long-running operations deliver their real outcome later
//! through named bridge events (see `core_runtime::events`).

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Capability check for the host bridge.
///
/// Implementations must be pure, side-effect-free, safe to call at high
/// frequency, and must never panic. Every bridge-backed behavior in the core
/// is gated on this predicate; when it returns `false`, callers switch to
/// their local fallback paths.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::host::BridgeAvailability;
///
/// fn can_use_native(bridge: &dyn BridgeAvailability) -> bool {
///     bridge.is_available()
/// }
/// ```
pub trait BridgeAvailability: Send + Sync {
    /// True iff the host bridge object exists in the current execution
    /// context and exposes a minimal invocation capability.
    fn is_available(&self) -> bool;
}

/// Host bridge invocation trait.
///
/// # Contract
///
/// - `invoke` resolves with whatever the module returns as its immediate
///   acknowledgement. For fire-and-forget modules (camera capture, permission
///   prompts) the acknowledgement carries no result; the outcome arrives as a
///   named bridge event with no correlation id.
/// - Implementations report a missing module/action with a message containing
///   `"404"`, `"not found"` or `"not available"` so the core can distinguish
///   misconfiguration from transient failure.
/// - No delivery-order or at-most-once guarantee is assumed for the event
///   channel; the core defends against duplicates itself.
///
/// # Platform Support
///
/// - **Native shell**: JS-to-native bridge object injected by the host
/// - **Web**: absent (`is_available` returns `false`), everything falls back
/// - **Tests**: scripted double returning canned responses per action
#[async_trait]
pub trait HostBridge: BridgeAvailability {
    /// Invoke a named action on a host module.
    async fn invoke(&self, module: &str, action: &str, params: Value) -> Result<Value>;
}
