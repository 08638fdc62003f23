//! # Core Configuration Module
//!
//! Provides configuration management for the SnapTask core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `CoreConfig` instance holding every capability the core needs injected:
//! the host bridge, the local fallback store and router, the capture
//! fallback, and tuning for timeouts and flush backoff. It enforces
//! fail-fast validation so a missing capability surfaces at startup with an
//! actionable message, not deep inside a flow.
//!
//! ## Required Dependencies
//!
//! - `HostBridge` - the invocation surface (a test double is fine; it only
//!   has to answer `is_available`)
//!
//! ## Optional Dependencies (with local defaults)
//!
//! - `KeyValueStore` - fallback storage (local-shims default: in-memory map)
//! - `LocalRouter` - navigation fallback (local-shims default: hash router)
//! - `CaptureFallback` - capture substitute (local-shims default: scripted)
//! - `RemoteStore` - remote documents (service default: host-backed adapter)
//! - `ConnectivityProbe` - initial online state (default: assume online)
//! - `Clock` - time source (default: system clock)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .host_bridge(Arc::new(MyBridge))
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    CaptureFallback, Clock, ConnectivityProbe, HostBridge, KeyValueStore, LocalRouter,
    RemoteStore, SystemClock,
};
use std::sync::Arc;
use std::time::Duration;

/// Default bound on a single native invocation.
pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default bound on waiting for a capture result event.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Default bound on waiting for a permission result event.
pub const DEFAULT_PERMISSION_TIMEOUT: Duration = Duration::from_millis(60_000);

/// Default remote collection for task documents.
pub const DEFAULT_TASK_COLLECTION: &str = "UserTasks";

/// Exponential backoff tuning for offline queue retries.
///
/// Delays double per consecutive failure starting at `initial`, capped at
/// `max`; any fully successful flush resets the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

impl BackoffConfig {
    /// Delay before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

/// Core configuration for the SnapTask core.
///
/// Holds all injected capabilities and settings required to construct the
/// service facade. Use [`CoreConfigBuilder`] to build instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Host bridge invocation surface (required)
    pub host_bridge: Arc<dyn HostBridge>,

    /// Local fallback key-value store behind the storage facade
    pub local_store: Arc<dyn KeyValueStore>,

    /// Local routing fallback behind the navigation facade
    pub router: Arc<dyn LocalRouter>,

    /// Capture substitute used when the native camera path fails
    pub capture_fallback: Arc<dyn CaptureFallback>,

    /// Remote document store; `None` means "use the host-backed adapter"
    pub remote_store: Option<Arc<dyn RemoteStore>>,

    /// Initial connectivity probe (optional)
    pub connectivity_probe: Option<Arc<dyn ConnectivityProbe>>,

    /// Time source
    pub clock: Arc<dyn Clock>,

    /// Bound on a single native invocation
    pub invoke_timeout: Duration,

    /// Bound on waiting for a capture result event
    pub capture_timeout: Duration,

    /// Bound on waiting for a permission result event
    pub permission_timeout: Duration,

    /// Offline queue retry backoff
    pub flush_backoff: BackoffConfig,

    /// Remote collection task documents live in
    pub task_collection: String,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("host_bridge", &"HostBridge { ... }")
            .field("local_store", &"KeyValueStore { ... }")
            .field("router", &"LocalRouter { ... }")
            .field("capture_fallback", &"CaptureFallback { ... }")
            .field(
                "remote_store",
                &self.remote_store.as_ref().map(|_| "RemoteStore { ... }"),
            )
            .field(
                "connectivity_probe",
                &self
                    .connectivity_probe
                    .as_ref()
                    .map(|_| "ConnectivityProbe { ... }"),
            )
            .field("invoke_timeout", &self.invoke_timeout)
            .field("capture_timeout", &self.capture_timeout)
            .field("permission_timeout", &self.permission_timeout)
            .field("flush_backoff", &self.flush_backoff)
            .field("task_collection", &self.task_collection)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.invoke_timeout.is_zero()
            || self.capture_timeout.is_zero()
            || self.permission_timeout.is_zero()
        {
            return Err(Error::Config(
                "Timeouts must be greater than zero".to_string(),
            ));
        }

        if self.flush_backoff.initial.is_zero() {
            return Err(Error::Config(
                "Backoff initial delay must be greater than zero".to_string(),
            ));
        }

        if self.flush_backoff.initial > self.flush_backoff.max {
            return Err(Error::Config(
                "Backoff initial delay exceeds its cap".to_string(),
            ));
        }

        if self.task_collection.is_empty() {
            return Err(Error::Config(
                "Task collection name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "local-shims"))]
fn capability_missing(capability: &str, hint: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{hint} Enable the 'local-shims' feature for the in-process default, \
             or inject a platform implementation."
        ),
    }
}

#[cfg(feature = "local-shims")]
fn provide_default_local_store() -> Result<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(bridge_local::MemoryKeyValueStore::new()))
}

#[cfg(not(feature = "local-shims"))]
fn provide_default_local_store() -> Result<Arc<dyn KeyValueStore>> {
    Err(capability_missing(
        "KeyValueStore",
        "A local fallback store is required behind the storage facade.",
    ))
}

#[cfg(feature = "local-shims")]
fn provide_default_router() -> Result<Arc<dyn LocalRouter>> {
    Ok(Arc::new(bridge_local::HashRouter::new()))
}

#[cfg(not(feature = "local-shims"))]
fn provide_default_router() -> Result<Arc<dyn LocalRouter>> {
    Err(capability_missing(
        "LocalRouter",
        "A routing fallback is required behind the navigation facade.",
    ))
}

#[cfg(feature = "local-shims")]
fn provide_default_capture_fallback() -> Result<Arc<dyn CaptureFallback>> {
    Ok(Arc::new(bridge_local::ScriptedCapture::cancelling()))
}

#[cfg(not(feature = "local-shims"))]
fn provide_default_capture_fallback() -> Result<Arc<dyn CaptureFallback>> {
    Err(capability_missing(
        "CaptureFallback",
        "A capture substitute is required for the camera fallback path.",
    ))
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    host_bridge: Option<Arc<dyn HostBridge>>,
    local_store: Option<Arc<dyn KeyValueStore>>,
    router: Option<Arc<dyn LocalRouter>>,
    capture_fallback: Option<Arc<dyn CaptureFallback>>,
    remote_store: Option<Arc<dyn RemoteStore>>,
    connectivity_probe: Option<Arc<dyn ConnectivityProbe>>,
    clock: Option<Arc<dyn Clock>>,
    invoke_timeout: Option<Duration>,
    capture_timeout: Option<Duration>,
    permission_timeout: Option<Duration>,
    flush_backoff: Option<BackoffConfig>,
    task_collection: Option<String>,
}

impl CoreConfigBuilder {
    /// Sets the host bridge (required).
    pub fn host_bridge(mut self, bridge: Arc<dyn HostBridge>) -> Self {
        self.host_bridge = Some(bridge);
        self
    }

    /// Sets the local fallback key-value store.
    pub fn local_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.local_store = Some(store);
        self
    }

    /// Sets the local routing fallback.
    pub fn router(mut self, router: Arc<dyn LocalRouter>) -> Self {
        self.router = Some(router);
        self
    }

    /// Sets the capture substitute.
    pub fn capture_fallback(mut self, fallback: Arc<dyn CaptureFallback>) -> Self {
        self.capture_fallback = Some(fallback);
        self
    }

    /// Sets the remote document store.
    ///
    /// When not provided, the service facade wires the host-backed adapter.
    pub fn remote_store(mut self, store: Arc<dyn RemoteStore>) -> Self {
        self.remote_store = Some(store);
        self
    }

    /// Sets the initial connectivity probe.
    pub fn connectivity_probe(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.connectivity_probe = Some(probe);
        self
    }

    /// Sets the time source. Defaults to the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Bound on a single native invocation. Default: 10 seconds.
    pub fn invoke_timeout(mut self, timeout: Duration) -> Self {
        self.invoke_timeout = Some(timeout);
        self
    }

    /// Bound on waiting for a capture result event. Default: 60 seconds.
    pub fn capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = Some(timeout);
        self
    }

    /// Bound on waiting for a permission result event. Default: 60 seconds.
    pub fn permission_timeout(mut self, timeout: Duration) -> Self {
        self.permission_timeout = Some(timeout);
        self
    }

    /// Offline queue retry backoff tuning.
    pub fn flush_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.flush_backoff = Some(backoff);
        self
    }

    /// Remote collection task documents live in. Default: `UserTasks`.
    pub fn task_collection(mut self, collection: impl Into<String>) -> Self {
        self.task_collection = Some(collection.into());
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// Returns an error with an actionable message when the host bridge is
    /// missing, a fallback capability has no default, or tuning values are
    /// invalid.
    pub fn build(self) -> Result<CoreConfig> {
        let host_bridge = self.host_bridge.ok_or_else(|| Error::CapabilityMissing {
            capability: "HostBridge".to_string(),
            message: "A host bridge implementation is required. \
                      Native shells inject the real bridge adapter; \
                      tests inject a scripted double."
                .to_string(),
        })?;

        let local_store = match self.local_store {
            Some(store) => store,
            None => provide_default_local_store()?,
        };

        let router = match self.router {
            Some(router) => router,
            None => provide_default_router()?,
        };

        let capture_fallback = match self.capture_fallback {
            Some(fallback) => fallback,
            None => provide_default_capture_fallback()?,
        };

        let config = CoreConfig {
            host_bridge,
            local_store,
            router,
            capture_fallback,
            remote_store: self.remote_store,
            connectivity_probe: self.connectivity_probe,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            invoke_timeout: self.invoke_timeout.unwrap_or(DEFAULT_INVOKE_TIMEOUT),
            capture_timeout: self.capture_timeout.unwrap_or(DEFAULT_CAPTURE_TIMEOUT),
            permission_timeout: self
                .permission_timeout
                .unwrap_or(DEFAULT_PERMISSION_TIMEOUT),
            flush_backoff: self.flush_backoff.unwrap_or_default(),
            task_collection: self
                .task_collection
                .unwrap_or_else(|| DEFAULT_TASK_COLLECTION.to_string()),
        };

        config.validate()?;

        Ok(config)
    }
}
