use crate::waiter::OperationKind;
use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeCallError {
    #[error("Host bridge is not available")]
    Unavailable,

    #[error("Native action not found: {module}.{action}")]
    ActionNotFound { module: String, action: String },

    #[error("Native call {module}.{action} timed out after {waited_ms} ms")]
    Timeout {
        module: String,
        action: String,
        waited_ms: u64,
    },

    #[error("Native error from {module}.{action}: {message}")]
    Native {
        module: String,
        action: String,
        message: String,
    },

    #[error("Permission denied: {permission}")]
    PermissionDenied { permission: String },

    #[error("Operation of kind '{kind}' already in flight")]
    OperationInFlight { kind: OperationKind },

    #[error("Fallback executor failed: {0}")]
    Fallback(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl BridgeCallError {
    /// Whether the error is absorbed by switching to a local fallback.
    ///
    /// `ActionNotFound` is a configuration defect and always surfaces;
    /// permission denials surface so the UI can re-prompt.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BridgeCallError::Unavailable
                | BridgeCallError::Timeout { .. }
                | BridgeCallError::Native { .. }
                | BridgeCallError::Bridge(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeCallError>;
