//! # Native Invoker
//!
//! Issues a single named `(module, action, params)` call against the host
//! bridge and normalizes its failure shapes.
//!
//! ## Failure classification
//!
//! - The bridge is absent → [`BridgeCallError::Unavailable`]
//! - The host reports a 404-equivalent (message containing "404",
//!   "not found" or "not available") → [`BridgeCallError::ActionNotFound`];
//!   this is a configuration defect and is never retried
//! - No acknowledgement within the bound → [`BridgeCallError::Timeout`];
//!   the racing call future is dropped, so a late host response surfaces
//!   only as an unmatched bridge event and is ignored, not retried
//! - Anything else → [`BridgeCallError::Native`]

use crate::error::{BridgeCallError, Result};
use bridge_traits::{BridgeError, HostBridge};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Timeout-bounded invocation front-end for the host bridge.
pub struct NativeInvoker {
    bridge: Arc<dyn HostBridge>,
    default_timeout: Duration,
}

impl NativeInvoker {
    pub fn new(bridge: Arc<dyn HostBridge>, default_timeout: Duration) -> Self {
        Self {
            bridge,
            default_timeout,
        }
    }

    /// Whether the host bridge is present in this execution context.
    pub fn is_available(&self) -> bool {
        self.bridge.is_available()
    }

    /// Invoke with the default timeout.
    pub async fn invoke(&self, module: &str, action: &str, params: Value) -> Result<Value> {
        self.invoke_with_timeout(module, action, params, self.default_timeout)
            .await
    }

    /// Invoke with an explicit timeout.
    pub async fn invoke_with_timeout(
        &self,
        module: &str,
        action: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value> {
        if !self.bridge.is_available() {
            return Err(BridgeCallError::Unavailable);
        }

        debug!(module = %module, action = %action, "Invoking native action");

        match tokio::time::timeout(timeout, self.bridge.invoke(module, action, params)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(normalize_failure(module, action, error)),
            Err(_elapsed) => {
                warn!(
                    module = %module,
                    action = %action,
                    timeout_ms = timeout.as_millis() as u64,
                    "Native call timed out"
                );
                Err(BridgeCallError::Timeout {
                    module: module.to_string(),
                    action: action.to_string(),
                    waited_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}

fn normalize_failure(module: &str, action: &str, error: BridgeError) -> BridgeCallError {
    match error {
        BridgeError::NotAvailable(_) => BridgeCallError::Unavailable,
        other => {
            let message = other.to_string();
            let lowered = message.to_lowercase();
            if lowered.contains("404")
                || lowered.contains("not found")
                || lowered.contains("not available")
            {
                BridgeCallError::ActionNotFound {
                    module: module.to_string(),
                    action: action.to_string(),
                }
            } else {
                BridgeCallError::Native {
                    module: module.to_string(),
                    action: action.to_string(),
                    message,
                }
            }
        }
    }
}
