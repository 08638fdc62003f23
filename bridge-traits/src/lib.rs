//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the SnapTask core and the host
//! application runtime that embeds it. Each trait represents a capability the
//! core requires but that is provided differently per host (native shell with
//! a real bridge object, plain web page, test harness).
//!
//! ## Traits
//!
//! ### Bridge surface
//! - [`BridgeAvailability`](host::BridgeAvailability) - Is the host bridge present at all?
//! - [`HostBridge`](host::HostBridge) - Named `(module, action, params)` invocation
//!
//! ### Storage
//! - [`KeyValueStore`](storage::KeyValueStore) - Local persistent key-value storage
//! - [`RemoteStore`](remote::RemoteStore) - Remote document store for task documents
//!
//! ### Fallbacks & platform integration
//! - [`CaptureFallback`](capture::CaptureFallback) - Browser-native photo capture substitute
//! - [`LocalRouter`](navigation::LocalRouter) - Hash-style routing when host navigation is absent
//! - [`ConnectivityProbe`](network::ConnectivityProbe) - Initial online/offline detection
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing; see `core_runtime::config` for the builder that enforces this.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Host implementations should:
//!
//! - Convert host-specific failures to `BridgeError`
//! - Provide actionable error messages
//! - Include context (module/action names, storage keys)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod capture;
pub mod error;
pub mod host;
pub mod navigation;
pub mod network;
pub mod remote;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use capture::{CaptureFallback, CapturedPhoto};
pub use host::{BridgeAvailability, HostBridge};
pub use navigation::LocalRouter;
pub use network::ConnectivityProbe;
pub use remote::RemoteStore;
pub use storage::KeyValueStore;
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
