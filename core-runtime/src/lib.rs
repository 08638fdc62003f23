//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the SnapTask core:
//! - Event bus for named bridge events
//! - Configuration management
//! - Logging and tracing infrastructure
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other core crates depend on.
//! It establishes the event-dispatch semantics the native-call reconciliation
//! layer is built on, the capability-injection configuration, and the logging
//! conventions used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
