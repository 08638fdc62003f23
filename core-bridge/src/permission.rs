//! # Permission Gate
//!
//! Permission request sub-protocol over the correlation waiter.
//!
//! ## Protocol
//!
//! Requesting a permission invokes the native module and waits on any of:
//!
//! - `<TYPE>_PERMISSION_RESULT` — payload carries the decision
//! - `PERMISSION_RESULT` — generic; accepted only when `payload.permission`
//!   names the requested type
//! - `<TYPE>_PERMISSION_GRANTED` / `<TYPE>_PERMISSION_DENIED` — decision is
//!   in the event name itself
//!
//! An immediate synchronous grant or denial in the invocation's own
//! acknowledgement (`{granted: true}`, `{status: "granted"}`) short-circuits
//! the wait. Whatever shape the host uses, the outcome funnels through one
//! parser into a single boolean decision; denial propagates as
//! [`BridgeCallError::PermissionDenied`] so the UI can re-prompt.

use crate::capture::CAMERA_MODULE;
use crate::error::{BridgeCallError, Result};
use crate::invoker::NativeInvoker;
use crate::waiter::{CorrelationWaiter, EventMatcher, OperationKind, Settlement, WaitSpec};
use bridge_traits::CaptureFallback;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Generic permission result event, shared by all permission types.
pub const PERMISSION_RESULT: &str = "PERMISSION_RESULT";

/// Action on the camera module that triggers the permission prompt.
pub const REQUEST_PERMISSION_ACTION: &str = "requestPermission";

/// Permission types the task flows request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    Camera,
    Gallery,
}

impl PermissionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::Camera => "camera",
            PermissionKind::Gallery => "gallery",
        }
    }

    fn event_prefix(&self) -> &'static str {
        match self {
            PermissionKind::Camera => "CAMERA",
            PermissionKind::Gallery => "GALLERY",
        }
    }

    /// Type-specific result event, e.g. `CAMERA_PERMISSION_RESULT`.
    pub fn result_event(&self) -> String {
        format!("{}_PERMISSION_RESULT", self.event_prefix())
    }

    /// Type-specific grant event, e.g. `CAMERA_PERMISSION_GRANTED`.
    pub fn granted_event(&self) -> String {
        format!("{}_PERMISSION_GRANTED", self.event_prefix())
    }

    /// Type-specific denial event, e.g. `CAMERA_PERMISSION_DENIED`.
    pub fn denied_event(&self) -> String {
        format!("{}_PERMISSION_DENIED", self.event_prefix())
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a host permission payload into a decision.
///
/// The host is inconsistent about its result shape; every variant observed
/// on the wire normalizes here and nowhere else.
pub fn parse_grant(payload: &Value) -> Option<bool> {
    match payload.get("granted") {
        Some(Value::Bool(granted)) => return Some(*granted),
        Some(Value::String(s)) if s == "true" => return Some(true),
        Some(Value::String(s)) if s == "false" => return Some(false),
        _ => {}
    }

    match payload.get("status").and_then(Value::as_str) {
        Some("granted") => Some(true),
        Some("denied") | Some("blocked") => Some(false),
        _ => None,
    }
}

/// Permission request front-end.
pub struct PermissionGate {
    invoker: Arc<NativeInvoker>,
    waiter: Arc<CorrelationWaiter>,
    fallback: Arc<dyn CaptureFallback>,
    timeout: Duration,
}

impl PermissionGate {
    pub fn new(
        invoker: Arc<NativeInvoker>,
        waiter: Arc<CorrelationWaiter>,
        fallback: Arc<dyn CaptureFallback>,
        timeout: Duration,
    ) -> Self {
        Self {
            invoker,
            waiter,
            fallback,
            timeout,
        }
    }

    /// Request `kind`; resolves `Ok(())` on grant.
    ///
    /// Denial returns [`BridgeCallError::PermissionDenied`]. With no bridge
    /// present the local platform permission path is used instead.
    pub async fn request(&self, kind: PermissionKind) -> Result<()> {
        if !self.invoker.is_available() {
            return self.request_via_fallback(kind).await;
        }

        // Listeners go up before the call is issued so a fast host cannot
        // slip its result event past us.
        let pending = self.waiter.begin(self.wait_spec(kind))?;

        let ack = self
            .invoker
            .invoke(
                CAMERA_MODULE,
                REQUEST_PERMISSION_ACTION,
                json!({ "type": kind.as_str() }),
            )
            .await;

        match ack {
            Ok(value) => {
                if let Some(granted) = parse_grant(&value) {
                    // Synchronous decision: settle without a timeout-based
                    // wait ever starting.
                    debug!(permission = %kind, granted, "Permission decided synchronously");
                    drop(pending);
                    return decision(kind, granted);
                }
                debug!(permission = %kind, "Permission pending, waiting for result event");
            }
            Err(BridgeCallError::Unavailable) => {
                drop(pending);
                return self.request_via_fallback(kind).await;
            }
            Err(error) => {
                drop(pending);
                return Err(error);
            }
        }

        match pending.wait().await {
            Settlement::Success { event, payload } => {
                let granted = if event.ends_with("_GRANTED") {
                    true
                } else if event.ends_with("_DENIED") {
                    false
                } else {
                    parse_grant(&payload).unwrap_or(false)
                };
                decision(kind, granted)
            }
            Settlement::Failure { event, payload } => {
                warn!(permission = %kind, event = %event, payload = %payload, "Permission failure event");
                decision(kind, false)
            }
            Settlement::TimedOut => Err(BridgeCallError::Timeout {
                module: CAMERA_MODULE.to_string(),
                action: REQUEST_PERMISSION_ACTION.to_string(),
                waited_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    async fn request_via_fallback(&self, kind: PermissionKind) -> Result<()> {
        let granted = self
            .fallback
            .request_permission()
            .await
            .map_err(|error| BridgeCallError::Fallback(error.to_string()))?;
        decision(kind, granted)
    }

    fn wait_spec(&self, kind: PermissionKind) -> WaitSpec {
        let wanted = kind.as_str();
        WaitSpec {
            kind: OperationKind::Permission,
            success: vec![
                EventMatcher::named(kind.result_event()),
                EventMatcher::filtered(PERMISSION_RESULT, move |payload| {
                    payload.get("permission").and_then(Value::as_str) == Some(wanted)
                }),
                EventMatcher::named(kind.granted_event()),
                EventMatcher::named(kind.denied_event()),
            ],
            failure: vec![],
            timeout: self.timeout,
        }
    }
}

fn decision(kind: PermissionKind, granted: bool) -> Result<()> {
    if granted {
        Ok(())
    } else {
        Err(BridgeCallError::PermissionDenied {
            permission: kind.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(
            PermissionKind::Camera.result_event(),
            "CAMERA_PERMISSION_RESULT"
        );
        assert_eq!(
            PermissionKind::Gallery.granted_event(),
            "GALLERY_PERMISSION_GRANTED"
        );
        assert_eq!(
            PermissionKind::Camera.denied_event(),
            "CAMERA_PERMISSION_DENIED"
        );
    }

    #[test]
    fn test_parse_grant_shapes() {
        assert_eq!(parse_grant(&json!({ "granted": true })), Some(true));
        assert_eq!(parse_grant(&json!({ "granted": false })), Some(false));
        assert_eq!(parse_grant(&json!({ "granted": "true" })), Some(true));
        assert_eq!(parse_grant(&json!({ "granted": "false" })), Some(false));
        assert_eq!(parse_grant(&json!({ "status": "granted" })), Some(true));
        assert_eq!(parse_grant(&json!({ "status": "denied" })), Some(false));
        assert_eq!(parse_grant(&json!({ "status": "blocked" })), Some(false));
        assert_eq!(parse_grant(&json!({ "status": "pending" })), None);
        assert_eq!(parse_grant(&json!({})), None);
        assert_eq!(parse_grant(&json!("granted")), None);
    }
}
