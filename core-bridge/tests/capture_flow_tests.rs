//! Integration tests for the capture and permission flows
//!
//! These tests drive the full event-correlation path: a scripted host bridge
//! acknowledges calls, result events are injected through the bus the way
//! the platform shell forwards them, and the flows settle against success,
//! error, timeout and fallback paths.

use bridge_local::{ScriptedBridge, ScriptedCapture};
use bridge_traits::CaptureFallback;
use core_bridge::capture::{CAMERA_MODULE, CAPTURE_ACTION};
use core_bridge::permission::REQUEST_PERMISSION_ACTION;
use core_bridge::{
    BridgeCallError, CameraService, CorrelationWaiter, NativeInvoker, PermissionGate,
    PermissionKind, CAMERA_CAPTURE_ERROR, CAMERA_CAPTURE_SUCCESS,
};
use core_runtime::events::EventBus;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    bridge: Arc<ScriptedBridge>,
    bus: EventBus,
    capture_fallback: Arc<ScriptedCapture>,
    camera: CameraService,
    permissions: Arc<PermissionGate>,
}

fn harness_with(
    bridge: ScriptedBridge,
    capture_fallback: ScriptedCapture,
    event_timeout: Duration,
) -> Harness {
    let bridge = Arc::new(bridge);
    let bus = EventBus::new();
    let capture_fallback = Arc::new(capture_fallback);

    let invoker = Arc::new(NativeInvoker::new(
        Arc::clone(&bridge) as Arc<dyn bridge_traits::HostBridge>,
        Duration::from_millis(500),
    ));
    let waiter = Arc::new(CorrelationWaiter::new(bus.clone()));
    let permissions = Arc::new(PermissionGate::new(
        Arc::clone(&invoker),
        Arc::clone(&waiter),
        Arc::clone(&capture_fallback) as Arc<dyn CaptureFallback>,
        event_timeout,
    ));
    let camera = CameraService::new(
        invoker,
        waiter,
        Arc::clone(&permissions),
        Arc::clone(&capture_fallback) as Arc<dyn CaptureFallback>,
        bus.clone(),
        event_timeout,
    );

    Harness {
        bridge,
        bus,
        capture_fallback,
        camera,
        permissions,
    }
}

fn emit_later(bus: &EventBus, delay: Duration, event: &'static str, payload: serde_json::Value) {
    let bus = bus.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        bus.emit(event, payload);
    });
}

// ============================================================================
// Capture
// ============================================================================

#[tokio::test]
async fn capture_resolves_with_uri_from_success_event() {
    let harness = harness_with(
        ScriptedBridge::new(),
        ScriptedCapture::cancelling(),
        Duration::from_secs(5),
    );

    emit_later(
        &harness.bus,
        Duration::from_millis(20),
        CAMERA_CAPTURE_SUCCESS,
        json!({ "uri": "file://a.jpg" }),
    );

    let photo = harness.camera.take_photo().await.unwrap();
    assert_eq!(photo.unwrap().uri, "file://a.jpg");

    assert_eq!(harness.bridge.call_count(CAMERA_MODULE, CAPTURE_ACTION), 1);
    assert_eq!(harness.capture_fallback.capture_calls(), 0);
}

#[tokio::test]
async fn capture_timeout_runs_fallback_and_cancel_resolves_none() {
    let harness = harness_with(
        ScriptedBridge::new(),
        ScriptedCapture::cancelling(),
        Duration::from_millis(50),
    );

    // No event ever arrives; the fallback picker is opened and the user
    // cancels it.
    let photo = harness.camera.take_photo().await.unwrap();
    assert_eq!(photo, None);
    assert_eq!(harness.capture_fallback.capture_calls(), 1);
}

#[tokio::test]
async fn capture_error_event_runs_fallback() {
    let harness = harness_with(
        ScriptedBridge::new(),
        ScriptedCapture::returning("data:image/jpeg;base64,ab"),
        Duration::from_secs(5),
    );

    emit_later(
        &harness.bus,
        Duration::from_millis(20),
        CAMERA_CAPTURE_ERROR,
        json!({ "error": "camera busy" }),
    );

    let photo = harness.camera.take_photo().await.unwrap();
    assert_eq!(photo.unwrap().uri, "data:image/jpeg;base64,ab");
    assert_eq!(harness.capture_fallback.capture_calls(), 1);
}

#[tokio::test]
async fn late_success_event_after_timeout_is_ignored() {
    let harness = harness_with(
        ScriptedBridge::new(),
        ScriptedCapture::cancelling(),
        Duration::from_millis(40),
    );

    let photo = harness.camera.take_photo().await.unwrap();
    assert_eq!(photo, None);
    assert_eq!(harness.capture_fallback.capture_calls(), 1);

    // The native result finally shows up, long after the fallback settled
    // the operation. Nobody is listening any more.
    let delivered = harness
        .bus
        .emit(CAMERA_CAPTURE_SUCCESS, json!({ "uri": "file://late.jpg" }));
    assert_eq!(delivered, 0);
}

#[tokio::test]
async fn capture_without_bridge_goes_straight_to_fallback() {
    let harness = harness_with(
        ScriptedBridge::absent(),
        ScriptedCapture::returning("file://web.jpg"),
        Duration::from_secs(5),
    );

    let photo = harness.camera.take_photo().await.unwrap();
    assert_eq!(photo.unwrap().uri, "file://web.jpg");

    assert_eq!(harness.bridge.call_count(CAMERA_MODULE, CAPTURE_ACTION), 0);
    assert_eq!(harness.capture_fallback.capture_calls(), 1);
}

#[tokio::test]
async fn capture_success_without_uri_resolves_none_without_fallback() {
    let harness = harness_with(
        ScriptedBridge::new(),
        ScriptedCapture::returning("file://unwanted.jpg"),
        Duration::from_secs(5),
    );

    emit_later(
        &harness.bus,
        Duration::from_millis(20),
        CAMERA_CAPTURE_SUCCESS,
        json!({ "status": "done" }),
    );

    // Success with nothing extractable is success-with-no-photo, not an
    // error, and must not open the fallback picker.
    let photo = harness.camera.take_photo().await.unwrap();
    assert_eq!(photo, None);
    assert_eq!(harness.capture_fallback.capture_calls(), 0);
}

#[tokio::test]
async fn misconfigured_capture_module_surfaces_error() {
    let bridge = ScriptedBridge::new();
    bridge.fail(CAMERA_MODULE, CAPTURE_ACTION, "StockCamera.capture not found");

    let harness = harness_with(
        bridge,
        ScriptedCapture::cancelling(),
        Duration::from_secs(5),
    );

    let error = harness.camera.take_photo().await.unwrap_err();
    assert!(matches!(error, BridgeCallError::ActionNotFound { .. }));
    // A configuration defect never opens the fallback picker.
    assert_eq!(harness.capture_fallback.capture_calls(), 0);
}

#[tokio::test]
async fn photo_captured_event_published_on_success() {
    let harness = harness_with(
        ScriptedBridge::new(),
        ScriptedCapture::cancelling(),
        Duration::from_secs(5),
    );

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let _sub = harness.bus.on("PHOTO_CAPTURED", move |payload| {
        seen_clone.lock().unwrap().push(payload.clone());
        Ok(())
    });

    emit_later(
        &harness.bus,
        Duration::from_millis(20),
        CAMERA_CAPTURE_SUCCESS,
        json!("file://plain.jpg"),
    );

    harness.camera.take_photo().await.unwrap();
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[json!({ "uri": "file://plain.jpg" })]
    );
}

// ============================================================================
// Permissions
// ============================================================================

#[tokio::test]
async fn synchronous_grant_short_circuits_the_wait() {
    let bridge = ScriptedBridge::new();
    bridge.respond(
        CAMERA_MODULE,
        REQUEST_PERMISSION_ACTION,
        json!({ "granted": true }),
    );

    let harness = harness_with(
        bridge,
        ScriptedCapture::cancelling(),
        Duration::from_secs(60),
    );

    harness
        .permissions
        .request(PermissionKind::Camera)
        .await
        .unwrap();

    // No listeners linger: the event wait was torn down without running.
    assert_eq!(harness.bus.listener_count("CAMERA_PERMISSION_RESULT"), 0);
    assert_eq!(harness.bus.listener_count("PERMISSION_RESULT"), 0);
}

#[tokio::test]
async fn synchronous_status_granted_is_accepted() {
    let bridge = ScriptedBridge::new();
    bridge.respond(
        CAMERA_MODULE,
        REQUEST_PERMISSION_ACTION,
        json!({ "status": "granted" }),
    );

    let harness = harness_with(
        bridge,
        ScriptedCapture::cancelling(),
        Duration::from_secs(60),
    );

    assert!(harness.permissions.request(PermissionKind::Camera).await.is_ok());
}

#[tokio::test]
async fn synchronous_denial_propagates() {
    let bridge = ScriptedBridge::new();
    bridge.respond(
        CAMERA_MODULE,
        REQUEST_PERMISSION_ACTION,
        json!({ "status": "denied" }),
    );

    let harness = harness_with(
        bridge,
        ScriptedCapture::cancelling(),
        Duration::from_secs(60),
    );

    let error = harness
        .permissions
        .request(PermissionKind::Camera)
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        BridgeCallError::PermissionDenied { ref permission } if permission == "camera"
    ));
}

#[tokio::test]
async fn pending_ack_waits_for_result_event() {
    let bridge = ScriptedBridge::new();
    bridge.respond(
        CAMERA_MODULE,
        REQUEST_PERMISSION_ACTION,
        json!({ "status": "pending" }),
    );

    let harness = harness_with(
        bridge,
        ScriptedCapture::cancelling(),
        Duration::from_secs(5),
    );

    emit_later(
        &harness.bus,
        Duration::from_millis(20),
        "CAMERA_PERMISSION_RESULT",
        json!({ "granted": true }),
    );

    harness
        .permissions
        .request(PermissionKind::Camera)
        .await
        .unwrap();
}

#[tokio::test]
async fn generic_result_for_other_permission_is_ignored() {
    let bridge = ScriptedBridge::new();
    bridge.respond(
        CAMERA_MODULE,
        REQUEST_PERMISSION_ACTION,
        json!({ "status": "pending" }),
    );

    let harness = harness_with(
        bridge,
        ScriptedCapture::cancelling(),
        Duration::from_secs(5),
    );

    // A gallery decision arrives while we wait for camera; it must not
    // settle the wait. The camera decision follows and does.
    emit_later(
        &harness.bus,
        Duration::from_millis(20),
        "PERMISSION_RESULT",
        json!({ "permission": "gallery", "granted": true }),
    );
    emit_later(
        &harness.bus,
        Duration::from_millis(60),
        "PERMISSION_RESULT",
        json!({ "permission": "camera", "granted": false }),
    );

    let error = harness
        .permissions
        .request(PermissionKind::Camera)
        .await
        .unwrap_err();
    assert!(matches!(error, BridgeCallError::PermissionDenied { .. }));
}

#[tokio::test]
async fn named_grant_and_denial_events_decide() {
    let bridge = ScriptedBridge::new();
    bridge.respond(
        CAMERA_MODULE,
        REQUEST_PERMISSION_ACTION,
        json!({ "status": "pending" }),
    );

    let harness = harness_with(
        bridge,
        ScriptedCapture::cancelling(),
        Duration::from_secs(5),
    );

    emit_later(
        &harness.bus,
        Duration::from_millis(20),
        "CAMERA_PERMISSION_GRANTED",
        json!({}),
    );
    harness
        .permissions
        .request(PermissionKind::Camera)
        .await
        .unwrap();

    emit_later(
        &harness.bus,
        Duration::from_millis(20),
        "CAMERA_PERMISSION_DENIED",
        json!({}),
    );
    let error = harness
        .permissions
        .request(PermissionKind::Camera)
        .await
        .unwrap_err();
    assert!(matches!(error, BridgeCallError::PermissionDenied { .. }));
}

#[tokio::test]
async fn permission_timeout_is_reported() {
    let bridge = ScriptedBridge::new();
    bridge.respond(
        CAMERA_MODULE,
        REQUEST_PERMISSION_ACTION,
        json!({ "status": "pending" }),
    );

    let harness = harness_with(
        bridge,
        ScriptedCapture::cancelling(),
        Duration::from_millis(50),
    );

    let error = harness
        .permissions
        .request(PermissionKind::Camera)
        .await
        .unwrap_err();
    assert!(matches!(error, BridgeCallError::Timeout { .. }));
}

#[tokio::test]
async fn absent_bridge_uses_local_permission_path() {
    let harness = harness_with(
        ScriptedBridge::absent(),
        ScriptedCapture::cancelling().with_permission(false),
        Duration::from_secs(5),
    );

    let error = harness
        .permissions
        .request(PermissionKind::Camera)
        .await
        .unwrap_err();
    assert!(matches!(error, BridgeCallError::PermissionDenied { .. }));
    assert_eq!(harness.capture_fallback.permission_calls(), 1);
    assert_eq!(
        harness
            .bridge
            .call_count(CAMERA_MODULE, REQUEST_PERMISSION_ACTION),
        0
    );
}

// ============================================================================
// Combined flow
// ============================================================================

#[tokio::test]
async fn capture_with_permission_happy_path() {
    let bridge = ScriptedBridge::new();
    bridge.respond(
        CAMERA_MODULE,
        REQUEST_PERMISSION_ACTION,
        json!({ "granted": true }),
    );

    let harness = harness_with(
        bridge,
        ScriptedCapture::cancelling(),
        Duration::from_secs(5),
    );

    emit_later(
        &harness.bus,
        Duration::from_millis(20),
        CAMERA_CAPTURE_SUCCESS,
        json!({ "data": { "uri": "file://nested.jpg" } }),
    );

    let photo = harness.camera.capture_with_permission().await.unwrap();
    assert_eq!(photo.unwrap().uri, "file://nested.jpg");
}

#[tokio::test]
async fn capture_with_permission_stops_on_denial() {
    let bridge = ScriptedBridge::new();
    bridge.respond(
        CAMERA_MODULE,
        REQUEST_PERMISSION_ACTION,
        json!({ "granted": false }),
    );

    let harness = harness_with(
        bridge,
        ScriptedCapture::cancelling(),
        Duration::from_secs(5),
    );

    let error = harness.camera.capture_with_permission().await.unwrap_err();
    assert!(matches!(error, BridgeCallError::PermissionDenied { .. }));
    // Capture was never attempted.
    assert_eq!(harness.bridge.call_count(CAMERA_MODULE, CAPTURE_ACTION), 0);
}
