//! # Correlation Waiter
//!
//! Pending-operation state machine correlating fire-and-forget native calls
//! with the named bridge events that eventually carry their results.
//!
//! ## Overview
//!
//! The host's modules acknowledge receipt immediately; the actual outcome of
//! a capture or permission prompt is delivered later through events like
//! `CAMERA_CAPTURE_SUCCESS` with no id tying them back to a specific call.
//! Correlation is therefore by event name and operation kind, which only
//! works while at most one operation of a kind is in flight — the waiter
//! enforces that with a kind-keyed guard instead of relying on callers to
//! avoid overlap.
//!
//! ## State machine
//!
//! ```text
//! Idle ──begin──> Waiting ──first matching event──> Settled(success|failure)
//!                    │
//!                    └────────timer fires──────────> Settled(timeout)
//! ```
//!
//! Settled is absorbing: the first settlement wins, listeners are removed,
//! and any event arriving afterwards is dropped by the bus. A `settled` flag
//! additionally guards against re-entrant delivery racing listener removal.
//!
//! ## Usage
//!
//! ```ignore
//! let waiter = CorrelationWaiter::new(bus.clone());
//! let pending = waiter.begin(WaitSpec {
//!     kind: OperationKind::Camera,
//!     success: vec![EventMatcher::named("CAMERA_CAPTURE_SUCCESS")],
//!     failure: vec![EventMatcher::named("CAMERA_CAPTURE_ERROR")],
//!     timeout: Duration::from_secs(60),
//! })?;
//! invoker.invoke("StockCamera", "capture", json!({})).await?;
//! match pending.wait().await {
//!     Settlement::Success { payload, .. } => { /* extract result */ }
//!     Settlement::Failure { .. } | Settlement::TimedOut => { /* fallback */ }
//! }
//! ```

use crate::error::{BridgeCallError, Result};
use core_runtime::events::{EventBus, Subscription};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, trace};

/// Kind of operation a wait correlates; the single-flight key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Camera,
    Permission,
    Custom(String),
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Camera => write!(f, "camera"),
            OperationKind::Permission => write!(f, "permission"),
            OperationKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// An event name plus an optional payload predicate.
///
/// The predicate covers events like the generic `PERMISSION_RESULT`, which
/// settles a wait only when its `permission` field names the requested type.
#[derive(Clone)]
pub struct EventMatcher {
    event: String,
    filter: Option<Arc<dyn Fn(&Value) -> bool + Send + Sync>>,
}

impl EventMatcher {
    /// Match every payload delivered under `event`.
    pub fn named(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            filter: None,
        }
    }

    /// Match only payloads for which `filter` returns true.
    pub fn filtered<F>(event: impl Into<String>, filter: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            event: event.into(),
            filter: Some(Arc::new(filter)),
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    fn matches(&self, payload: &Value) -> bool {
        match &self.filter {
            Some(filter) => filter(payload),
            None => true,
        }
    }
}

impl fmt::Debug for EventMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventMatcher")
            .field("event", &self.event)
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

/// Description of one correlation wait.
#[derive(Debug)]
pub struct WaitSpec {
    pub kind: OperationKind,
    pub success: Vec<EventMatcher>,
    pub failure: Vec<EventMatcher>,
    pub timeout: Duration,
}

/// Terminal outcome of a pending operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// A success event arrived first.
    Success { event: String, payload: Value },
    /// A failure event arrived first.
    Failure { event: String, payload: Value },
    /// The timer fired before any matching event.
    TimedOut,
}

/// Observable state of a pending operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Waiting,
    Settled,
}

struct SettleState {
    slot: Mutex<Option<oneshot::Sender<Settlement>>>,
    settled: AtomicBool,
}

impl SettleState {
    fn new(tx: oneshot::Sender<Settlement>) -> Self {
        Self {
            slot: Mutex::new(Some(tx)),
            settled: AtomicBool::new(false),
        }
    }

    /// First caller wins; every later settlement attempt is dropped.
    fn settle(&self, settlement: Settlement) -> bool {
        if self.settled.swap(true, Ordering::SeqCst) {
            return false;
        }
        let sender = self.slot.lock().expect("settle slot poisoned").take();
        match sender {
            Some(tx) => {
                // The receiver may already be gone (wait future dropped);
                // the operation still counts as settled.
                let _ = tx.send(settlement);
                true
            }
            None => false,
        }
    }

    fn mark_settled(&self) {
        self.settled.store(true, Ordering::SeqCst);
        self.slot.lock().expect("settle slot poisoned").take();
    }

    fn is_settled(&self) -> bool {
        self.settled.load(Ordering::SeqCst)
    }
}

struct InFlightGuard {
    kinds: Arc<Mutex<HashSet<OperationKind>>>,
    kind: OperationKind,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.kinds
            .lock()
            .expect("in-flight set poisoned")
            .remove(&self.kind);
    }
}

/// One in-flight correlation.
///
/// Dropping it — settled or not — removes every listener it registered and
/// releases its kind for the next operation.
pub struct PendingOperation {
    kind: OperationKind,
    created_at: Instant,
    timeout: Duration,
    rx: oneshot::Receiver<Settlement>,
    state: Arc<SettleState>,
    _subscriptions: Vec<Subscription>,
    _guard: InFlightGuard,
}

impl PendingOperation {
    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn state(&self) -> WaitState {
        if self.state.is_settled() {
            WaitState::Settled
        } else {
            WaitState::Waiting
        }
    }

    /// Wait for settlement, bounded by the operation's timeout.
    ///
    /// Consumes the operation; listeners are removed on return regardless of
    /// the outcome.
    pub async fn wait(mut self) -> Settlement {
        match tokio::time::timeout(self.timeout, &mut self.rx).await {
            Ok(Ok(settlement)) => {
                debug!(kind = %self.kind, settlement = ?settlement_name(&settlement), "Operation settled");
                settlement
            }
            Ok(Err(_closed)) => {
                // Sender vanished without sending; treat as a timeout so the
                // caller still runs its fallback.
                self.state.mark_settled();
                Settlement::TimedOut
            }
            Err(_elapsed) => {
                // Close the settlement slot first so an event being
                // dispatched right now cannot win after the timer already
                // has.
                self.state.mark_settled();
                debug!(kind = %self.kind, timeout_ms = self.timeout.as_millis() as u64, "Operation timed out");
                Settlement::TimedOut
            }
        }
    }
}

impl fmt::Debug for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOperation")
            .field("kind", &self.kind)
            .field("state", &self.state())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn settlement_name(settlement: &Settlement) -> &'static str {
    match settlement {
        Settlement::Success { .. } => "success",
        Settlement::Failure { .. } => "failure",
        Settlement::TimedOut => "timeout",
    }
}

/// Factory for pending operations over one event bus.
pub struct CorrelationWaiter {
    bus: EventBus,
    in_flight: Arc<Mutex<HashSet<OperationKind>>>,
}

impl CorrelationWaiter {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Register listeners for `spec` and transition the operation to
    /// Waiting.
    ///
    /// Fails with [`BridgeCallError::OperationInFlight`] when an operation
    /// of the same kind has not settled yet — event-name correlation cannot
    /// tell two concurrent captures apart.
    pub fn begin(&self, spec: WaitSpec) -> Result<PendingOperation> {
        {
            let mut in_flight = self.in_flight.lock().expect("in-flight set poisoned");
            if !in_flight.insert(spec.kind.clone()) {
                return Err(BridgeCallError::OperationInFlight {
                    kind: spec.kind.clone(),
                });
            }
        }
        let guard = InFlightGuard {
            kinds: Arc::clone(&self.in_flight),
            kind: spec.kind.clone(),
        };

        let (tx, rx) = oneshot::channel();
        let state = Arc::new(SettleState::new(tx));

        let mut subscriptions =
            Vec::with_capacity(spec.success.len() + spec.failure.len());

        for matcher in &spec.success {
            subscriptions.push(self.listen(matcher.clone(), Arc::clone(&state), true));
        }
        for matcher in &spec.failure {
            subscriptions.push(self.listen(matcher.clone(), Arc::clone(&state), false));
        }

        trace!(kind = %spec.kind, listeners = subscriptions.len(), "Operation waiting");

        Ok(PendingOperation {
            kind: spec.kind,
            created_at: Instant::now(),
            timeout: spec.timeout,
            rx,
            state,
            _subscriptions: subscriptions,
            _guard: guard,
        })
    }

    fn listen(
        &self,
        matcher: EventMatcher,
        state: Arc<SettleState>,
        is_success: bool,
    ) -> Subscription {
        let event_name = matcher.event.clone();
        self.bus.on(&event_name, move |payload| {
            if state.is_settled() || !matcher.matches(payload) {
                return Ok(());
            }
            let settlement = if is_success {
                Settlement::Success {
                    event: matcher.event.clone(),
                    payload: payload.clone(),
                }
            } else {
                Settlement::Failure {
                    event: matcher.event.clone(),
                    payload: payload.clone(),
                }
            };
            state.settle(settlement);
            Ok(())
        })
    }
}

impl fmt::Debug for CorrelationWaiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_flight = self.in_flight.lock().expect("in-flight set poisoned");
        f.debug_struct("CorrelationWaiter")
            .field("in_flight", &in_flight.len())
            .finish()
    }
}
