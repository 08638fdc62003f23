//! Scripted Capture Double
//!
//! Stands in for the browser file-input capture path, the way the original
//! development harness mocked its native modules.

use async_trait::async_trait;
use bridge_traits::capture::{CaptureFallback, CapturedPhoto};
use bridge_traits::error::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Capture fallback with a scripted outcome.
///
/// Defaults to "user cancelled the picker" (`capture` resolves `None`,
/// permission granted). Call counts are recorded so flows can assert whether
/// the fallback path actually ran.
#[derive(Debug)]
pub struct ScriptedCapture {
    photo: Mutex<Option<CapturedPhoto>>,
    permission: AtomicBool,
    capture_calls: AtomicUsize,
    permission_calls: AtomicUsize,
}

impl Default for ScriptedCapture {
    fn default() -> Self {
        Self {
            photo: Mutex::new(None),
            permission: AtomicBool::new(true),
            capture_calls: AtomicUsize::new(0),
            permission_calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedCapture {
    /// Fallback that behaves like a cancelled picker.
    pub fn cancelling() -> Self {
        Self::default()
    }

    /// Fallback that resolves every capture with the given URI.
    pub fn returning(uri: impl Into<String>) -> Self {
        Self {
            photo: Mutex::new(Some(CapturedPhoto::new(uri))),
            ..Self::default()
        }
    }

    /// Override the permission outcome.
    pub fn with_permission(self, granted: bool) -> Self {
        self.permission.store(granted, Ordering::SeqCst);
        self
    }

    pub fn capture_calls(&self) -> usize {
        self.capture_calls.load(Ordering::SeqCst)
    }

    pub fn permission_calls(&self) -> usize {
        self.permission_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureFallback for ScriptedCapture {
    async fn capture(&self) -> Result<Option<CapturedPhoto>> {
        self.capture_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.photo.lock().await.clone())
    }

    async fn request_permission(&self) -> Result<bool> {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.permission.load(Ordering::SeqCst))
    }
}
