//! Scripted Host Bridge Double
//!
//! In-process stand-in for the host bridge object, mirroring how the
//! original development harness registered mock modules against the runtime.
//! Responses are scripted per `(module, action)` pair and every invocation is
//! recorded for assertions.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::host::{BridgeAvailability, HostBridge};
use bridge_traits::BridgeError;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Scripted outcome for one `(module, action)` pair.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Resolve with the given acknowledgement value.
    Value(Value),
    /// Fail with the given message.
    Failure(String),
    /// Never respond; lets callers exercise their timeout paths.
    Hang,
}

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub module: String,
    pub action: String,
    pub params: Value,
}

/// Host bridge double with scripted per-action responses.
///
/// Unscripted actions acknowledge with an empty object, which matches the
/// fire-and-forget modules whose real outcome arrives later as an event.
#[derive(Debug, Default)]
pub struct ScriptedBridge {
    unavailable: AtomicBool,
    responses: Mutex<HashMap<(String, String), ScriptedResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bridge that reports itself absent.
    pub fn absent() -> Self {
        let bridge = Self::default();
        bridge.unavailable.store(true, Ordering::SeqCst);
        bridge
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Script an acknowledgement value for `(module, action)`.
    pub fn respond(&self, module: &str, action: &str, value: Value) {
        self.script(module, action, ScriptedResponse::Value(value));
    }

    /// Script a failure message for `(module, action)`.
    pub fn fail(&self, module: &str, action: &str, message: &str) {
        self.script(module, action, ScriptedResponse::Failure(message.to_string()));
    }

    /// Script `(module, action)` to never respond.
    pub fn hang(&self, module: &str, action: &str) {
        self.script(module, action, ScriptedResponse::Hang);
    }

    fn script(&self, module: &str, action: &str, response: ScriptedResponse) {
        self.responses
            .lock()
            .expect("scripted responses poisoned")
            .insert((module.to_string(), action.to_string()), response);
    }

    /// All recorded invocations in call order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("recorded calls poisoned").clone()
    }

    /// Number of invocations of `(module, action)`.
    pub fn call_count(&self, module: &str, action: &str) -> usize {
        self.calls
            .lock()
            .expect("recorded calls poisoned")
            .iter()
            .filter(|call| call.module == module && call.action == action)
            .count()
    }
}

impl BridgeAvailability for ScriptedBridge {
    fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostBridge for ScriptedBridge {
    async fn invoke(&self, module: &str, action: &str, params: Value) -> Result<Value> {
        self.calls
            .lock()
            .expect("recorded calls poisoned")
            .push(RecordedCall {
                module: module.to_string(),
                action: action.to_string(),
                params,
            });

        if !self.is_available() {
            return Err(BridgeError::NotAvailable("host bridge".to_string()));
        }

        let response = self
            .responses
            .lock()
            .expect("scripted responses poisoned")
            .get(&(module.to_string(), action.to_string()))
            .cloned();

        match response {
            None => Ok(json!({})),
            Some(ScriptedResponse::Value(value)) => Ok(value),
            Some(ScriptedResponse::Failure(message)) => {
                Err(BridgeError::OperationFailed(message))
            }
            Some(ScriptedResponse::Hang) => std::future::pending().await,
        }
    }
}
