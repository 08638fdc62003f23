//! # Camera Service
//!
//! The full photo capture flow: issue the native capture call, wait for the
//! result event, extract the photo URI, and substitute the local capture
//! fallback when the native path fails, times out, or is absent.

use crate::error::{BridgeCallError, Result};
use crate::invoker::NativeInvoker;
use crate::permission::{PermissionGate, PermissionKind};
use crate::waiter::{CorrelationWaiter, EventMatcher, OperationKind, Settlement, WaitSpec};
use bridge_traits::capture::{CaptureFallback, CapturedPhoto};
use core_runtime::events::EventBus;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Host module providing the native camera.
pub const CAMERA_MODULE: &str = "StockCamera";

/// Capture action; acknowledges immediately, result arrives as an event.
pub const CAPTURE_ACTION: &str = "capture";

/// Bridge event carrying a successful capture result.
pub const CAMERA_CAPTURE_SUCCESS: &str = "CAMERA_CAPTURE_SUCCESS";

/// Bridge event carrying a capture failure.
pub const CAMERA_CAPTURE_ERROR: &str = "CAMERA_CAPTURE_ERROR";

/// Application event published when any path produced a photo.
pub const PHOTO_CAPTURED: &str = "PHOTO_CAPTURED";

/// Pull a photo URI out of a capture result payload.
///
/// Hosts differ in where they put it; candidates in priority order are the
/// plain string payload, `uri`, `url`, then `data.uri`.
pub fn extract_photo_uri(payload: &Value) -> Option<String> {
    if let Some(uri) = payload.as_str() {
        return Some(uri.to_string());
    }
    if let Some(uri) = payload.get("uri").and_then(Value::as_str) {
        return Some(uri.to_string());
    }
    if let Some(uri) = payload.get("url").and_then(Value::as_str) {
        return Some(uri.to_string());
    }
    payload
        .get("data")
        .and_then(|data| data.get("uri"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Photo capture front-end used by the task creation flow.
pub struct CameraService {
    invoker: Arc<NativeInvoker>,
    waiter: Arc<CorrelationWaiter>,
    permissions: Arc<PermissionGate>,
    fallback: Arc<dyn CaptureFallback>,
    bus: EventBus,
    timeout: Duration,
}

impl CameraService {
    pub fn new(
        invoker: Arc<NativeInvoker>,
        waiter: Arc<CorrelationWaiter>,
        permissions: Arc<PermissionGate>,
        fallback: Arc<dyn CaptureFallback>,
        bus: EventBus,
        timeout: Duration,
    ) -> Self {
        Self {
            invoker,
            waiter,
            permissions,
            fallback,
            bus,
            timeout,
        }
    }

    /// Request camera permission, then capture.
    ///
    /// Permission denial propagates; everything the capture path can absorb
    /// is absorbed by [`take_photo`](Self::take_photo).
    pub async fn capture_with_permission(&self) -> Result<Option<CapturedPhoto>> {
        self.permissions.request(PermissionKind::Camera).await?;
        self.take_photo().await
    }

    /// Capture a photo.
    ///
    /// Resolves `Ok(None)` when no photo was produced but nothing went
    /// wrong (native success without a usable URI, or the user cancelled
    /// the fallback picker). A misconfigured module
    /// ([`BridgeCallError::ActionNotFound`]) and fallback executor failures
    /// are the only errors that surface.
    pub async fn take_photo(&self) -> Result<Option<CapturedPhoto>> {
        if !self.invoker.is_available() {
            debug!("Bridge absent, using capture fallback directly");
            return self.run_fallback().await;
        }

        // Listeners first: the result event may fire before the
        // acknowledgement settles.
        let pending = self.waiter.begin(WaitSpec {
            kind: OperationKind::Camera,
            success: vec![EventMatcher::named(CAMERA_CAPTURE_SUCCESS)],
            failure: vec![EventMatcher::named(CAMERA_CAPTURE_ERROR)],
            timeout: self.timeout,
        })?;

        if let Err(error) = self
            .invoker
            .invoke(CAMERA_MODULE, CAPTURE_ACTION, json!({}))
            .await
        {
            drop(pending);
            if error.is_recoverable() {
                warn!(error = %error, "Native capture call failed, using fallback");
                return self.run_fallback().await;
            }
            return Err(error);
        }

        match pending.wait().await {
            Settlement::Success { payload, .. } => match extract_photo_uri(&payload) {
                Some(uri) => {
                    info!(uri = %uri, "Native capture succeeded");
                    self.publish_photo(&uri);
                    Ok(Some(CapturedPhoto::new(uri)))
                }
                None => {
                    // Native path finished but handed back nothing usable;
                    // that is a success with no photo, not an error.
                    warn!(payload = %payload, "Capture result carried no URI");
                    Ok(None)
                }
            },
            Settlement::Failure { payload, .. } => {
                warn!(payload = %payload, "Native capture reported an error, using fallback");
                self.run_fallback().await
            }
            Settlement::TimedOut => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Native capture timed out, using fallback");
                self.run_fallback().await
            }
        }
    }

    async fn run_fallback(&self) -> Result<Option<CapturedPhoto>> {
        let photo = self
            .fallback
            .capture()
            .await
            .map_err(|error| BridgeCallError::Fallback(error.to_string()))?;

        if let Some(photo) = &photo {
            self.publish_photo(&photo.uri);
        }
        Ok(photo)
    }

    fn publish_photo(&self, uri: &str) {
        self.bus.emit(PHOTO_CAPTURED, json!({ "uri": uri }));
    }
}
