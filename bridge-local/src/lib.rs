//! # Local Bridge Implementations
//!
//! In-process implementations of the bridge traits, used when the host bridge
//! is absent (plain web page, development harness, tests).
//!
//! ## Overview
//!
//! This crate provides the fallback side of every bridge capability:
//! - `KeyValueStore` as an in-memory map (`MemoryKeyValueStore`)
//! - `LocalRouter` as a hash-style route stack (`HashRouter`)
//! - `CaptureFallback` as a scripted double (`ScriptedCapture`)
//! - `ConnectivityProbe` as a fixed value (`StaticConnectivityProbe`)
//! - `HostBridge` as a scripted double (`ScriptedBridge`)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_local::{HashRouter, MemoryKeyValueStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryKeyValueStore::new());
//! let router = Arc::new(HashRouter::new());
//! // Inject into core configuration
//! ```

mod bridge;
mod capture;
mod probe;
mod router;
mod store;

pub use bridge::{RecordedCall, ScriptedBridge, ScriptedResponse};
pub use capture::ScriptedCapture;
pub use probe::StaticConnectivityProbe;
pub use router::HashRouter;
pub use store::MemoryKeyValueStore;
