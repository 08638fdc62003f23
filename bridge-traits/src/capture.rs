//! Photo Capture Fallback Surface
//!
//! When the native camera path fails, times out, or the bridge is absent, the
//! core substitutes a host-local capture implementation. On the web that is a
//! file-input element plus a local file read; in tests it is a scripted
//! double.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A captured photo, reduced to the URI the task flows care about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedPhoto {
    /// `file://`, `content://` or `data:` URI of the captured image.
    pub uri: String,
}

impl CapturedPhoto {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// Local substitute for the native camera module.
///
/// # Contract
///
/// - `capture` resolves `Ok(None)` when the user dismisses the picker without
///   choosing a file; that is a normal outcome, not an error.
/// - Errors from this trait are final: there is no further fallback level.
#[async_trait]
pub trait CaptureFallback: Send + Sync {
    /// Open the local capture UI and wait for the user's choice.
    async fn capture(&self) -> Result<Option<CapturedPhoto>>;

    /// Request camera access through the local platform (e.g. getUserMedia).
    ///
    /// Returns whether access was granted.
    async fn request_permission(&self) -> Result<bool>;
}
