//! # Event Bus System
//!
//! Named-event publish/subscribe for bridge events and application events.
//!
//! ## Overview
//!
//! Host modules acknowledge invocations immediately and deliver their real
//! outcomes later as named events with JSON payloads. This bus is the single
//! in-process representation of that event surface: the platform shell
//! forwards every host event into it, core components publish their own
//! application events on it, and the correlation layer registers temporary
//! listeners on it while an operation is in flight.
//!
//! ## Dispatch semantics
//!
//! - `emit` invokes every handler currently registered for the name,
//!   synchronously, in registration order.
//! - Dispatch runs against a snapshot of the handler list taken at
//!   emit-time, so handlers may register, deregister, or emit again without
//!   deadlocking or skipping peers.
//! - A handler returning an error is logged and does not prevent later
//!   handlers from running.
//! - There is no buffering: an event with no registered handler is dropped.
//!
//! ## Subscriptions
//!
//! [`EventBus::on`] returns a [`Subscription`] guard; dropping the guard
//! deregisters the handler. This makes listener cleanup automatic when a
//! pending operation settles or is cancelled mid-wait.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::EventBus;
//! use serde_json::json;
//!
//! let bus = EventBus::new();
//! let _sub = bus.on("CONNECTIVITY_CHANGE", |payload| {
//!     println!("online: {:?}", payload.get("isOnline"));
//!     Ok(())
//! });
//!
//! let delivered = bus.emit("CONNECTIVITY_CHANGE", json!({ "isOnline": true }));
//! assert_eq!(delivered, 1);
//! ```

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{trace, warn};

/// Outcome of a single handler invocation.
///
/// Errors are reported per-handler and never interrupt dispatch.
pub type HandlerResult = anyhow::Result<()>;

type Handler = Arc<dyn Fn(&Value) -> HandlerResult + Send + Sync>;

/// Opaque identity of a registered handler.
///
/// Closures cannot be compared, so deregistration goes through the id handed
/// out at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Entry {
    id: HandlerId,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    listeners: Mutex<HashMap<String, Vec<Entry>>>,
    next_id: AtomicU64,
}

impl Registry {
    fn remove(&self, event: &str, id: HandlerId) {
        let mut listeners = self.listeners.lock().expect("event registry poisoned");
        if let Some(entries) = listeners.get_mut(event) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                listeners.remove(event);
            }
        }
    }
}

/// Central bus for publishing and subscribing to named events.
///
/// Cheap to clone; clones share the same listener registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `event`.
    ///
    /// Handlers run in registration order. The returned [`Subscription`]
    /// deregisters the handler when dropped; call
    /// [`Subscription::detach`] to keep the handler alive for the lifetime
    /// of the bus instead.
    pub fn on<F>(&self, event: &str, handler: F) -> Subscription
    where
        F: Fn(&Value) -> HandlerResult + Send + Sync + 'static,
    {
        let id = HandlerId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = Entry {
            id,
            handler: Arc::new(handler),
        };

        self.registry
            .listeners
            .lock()
            .expect("event registry poisoned")
            .entry(event.to_string())
            .or_default()
            .push(entry);

        trace!(event = %event, handler_id = id.0, "Listener registered");

        Subscription {
            registry: Arc::downgrade(&self.registry),
            event: event.to_string(),
            id,
            active: true,
        }
    }

    /// Deregister the handler with the given id from `event`.
    ///
    /// Removing an unknown handler is a no-op. A handler removed while an
    /// emission is in progress still sees that emission (snapshot
    /// semantics).
    pub fn off(&self, event: &str, id: HandlerId) {
        self.registry.remove(event, id);
    }

    /// Publish `payload` to every handler registered for `event`.
    ///
    /// Returns the number of handlers invoked. Events with no registered
    /// handler are dropped silently.
    pub fn emit(&self, event: &str, payload: Value) -> usize {
        // Snapshot under the lock, dispatch outside it: handlers may
        // re-enter the bus (emit, on, off, drop a Subscription) freely.
        let snapshot: Vec<(HandlerId, Handler)> = {
            let listeners = self.registry.listeners.lock().expect("event registry poisoned");
            match listeners.get(event) {
                Some(entries) => entries
                    .iter()
                    .map(|entry| (entry.id, Arc::clone(&entry.handler)))
                    .collect(),
                None => Vec::new(),
            }
        };

        if snapshot.is_empty() {
            trace!(event = %event, "Event dropped, no listeners");
            return 0;
        }

        let mut invoked = 0;
        for (id, handler) in snapshot {
            invoked += 1;
            if let Err(error) = handler(&payload) {
                warn!(
                    event = %event,
                    handler_id = id.0,
                    error = %error,
                    "Event handler failed, continuing with remaining handlers"
                );
            }
        }
        invoked
    }

    /// Number of handlers currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.registry
            .listeners
            .lock()
            .expect("event registry poisoned")
            .get(event)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Total number of registered handlers across all events.
    pub fn total_listeners(&self) -> usize {
        self.registry
            .listeners
            .lock()
            .expect("event registry poisoned")
            .values()
            .map(|entries| entries.len())
            .sum()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("total_listeners", &self.total_listeners())
            .finish()
    }
}

/// RAII registration guard returned by [`EventBus::on`].
///
/// Dropping the guard removes the handler from the bus. The guard holds only
/// a weak reference to the registry, so it never keeps a torn-down bus
/// alive.
pub struct Subscription {
    registry: Weak<Registry>,
    event: String,
    id: HandlerId,
    active: bool,
}

impl Subscription {
    /// Id of the registered handler, usable with [`EventBus::off`].
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Event name the handler is registered for.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Consume the guard without deregistering the handler.
    ///
    /// The handler then lives as long as the bus; it can still be removed
    /// manually via [`EventBus::off`] with the returned id.
    pub fn detach(mut self) -> HandlerId {
        self.active = false;
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.event, self.id);
            trace!(event = %self.event, handler_id = self.id.0, "Listener removed");
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_without_listeners_is_dropped() {
        let bus = EventBus::new();
        assert_eq!(bus.emit("CAMERA_CAPTURE_SUCCESS", json!({})), 0);
    }

    #[test]
    fn test_emit_reaches_registered_handler() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        let _sub = bus.on("PHOTO_CAPTURED", move |payload| {
            seen_clone.lock().unwrap().push(payload.clone());
            Ok(())
        });

        let delivered = bus.emit("PHOTO_CAPTURED", json!({ "uri": "file://a.jpg" }));
        assert_eq!(delivered, 1);
        assert_eq!(seen.lock().unwrap().as_slice(), &[json!({ "uri": "file://a.jpg" })]);
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let order1 = Arc::clone(&order);
        let _first = bus.on("NAVIGATION", move |_| {
            order1.lock().unwrap().push(1);
            Ok(())
        });

        let order2 = Arc::clone(&order);
        let _second = bus.on("NAVIGATION", move |_| {
            order2.lock().unwrap().push(2);
            Ok(())
        });

        bus.emit("NAVIGATION", json!({ "to": "tasklist" }));
        assert_eq!(order.lock().unwrap().as_slice(), &[1, 2]);
    }

    #[test]
    fn test_failing_handler_does_not_stop_dispatch() {
        let bus = EventBus::new();
        let reached = Arc::new(AtomicUsize::new(0));

        let _failing = bus.on("SYNC_FAILED", |_| anyhow::bail!("handler exploded"));

        let reached_clone = Arc::clone(&reached);
        let _second = bus.on("SYNC_FAILED", move |_| {
            reached_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let delivered = bus.emit("SYNC_FAILED", json!({ "message": "boom" }));
        assert_eq!(delivered, 2);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropping_subscription_removes_handler() {
        let bus = EventBus::new();
        let sub = bus.on("CONNECTIVITY_CHANGE", |_| Ok(()));
        assert_eq!(bus.listener_count("CONNECTIVITY_CHANGE"), 1);

        drop(sub);
        assert_eq!(bus.listener_count("CONNECTIVITY_CHANGE"), 0);
        assert_eq!(bus.emit("CONNECTIVITY_CHANGE", json!({})), 0);
    }

    #[test]
    fn test_off_by_id() {
        let bus = EventBus::new();
        let id = bus.on("TASK_CREATED", |_| Ok(())).detach();
        assert_eq!(bus.listener_count("TASK_CREATED"), 1);

        bus.off("TASK_CREATED", id);
        assert_eq!(bus.listener_count("TASK_CREATED"), 0);
    }

    #[test]
    fn test_reentrant_emit_from_handler() {
        let bus = EventBus::new();
        let forwarded = Arc::new(AtomicUsize::new(0));

        // Normalizing handler: raw host event re-published under an
        // application-level name, exactly like the connectivity monitor.
        let bus_clone = bus.clone();
        let _raw = bus.on("CONNECTIVITY_CHANGE", move |payload| {
            bus_clone.emit("connectivityChange", payload.clone());
            Ok(())
        });

        let forwarded_clone = Arc::clone(&forwarded);
        let _normalized = bus.on("connectivityChange", move |_| {
            forwarded_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.emit("CONNECTIVITY_CHANGE", json!({ "isOnline": true }));
        assert_eq!(forwarded.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_removed_mid_dispatch_still_sees_snapshot() {
        let bus = EventBus::new();
        let second_ran = Arc::new(AtomicUsize::new(0));

        let second = bus.on("DATA_CHANGED", {
            let second_ran = Arc::clone(&second_ran);
            move |_| {
                second_ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        let second_id = second.detach();

        // First handler (registered after, but removes the other one by id
        // during dispatch of an earlier registration snapshot).
        let bus_clone = bus.clone();
        let _remover = bus.on("DATA_CHANGED", move |_| {
            bus_clone.off("DATA_CHANGED", second_id);
            Ok(())
        });

        // Both were registered when emit snapshotted the list, so both run.
        let delivered = bus.emit("DATA_CHANGED", json!({}));
        assert_eq!(delivered, 2);
        assert_eq!(second_ran.load(Ordering::SeqCst), 1);

        // Next emission only reaches the remover.
        assert_eq!(bus.emit("DATA_CHANGED", json!({})), 1);
    }

    #[test]
    fn test_multiple_subscribers_same_event_all_invoked() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let subs: Vec<_> = (0..3)
            .map(|_| {
                let count = Arc::clone(&count);
                bus.on("CAMERA_CAPTURE_SUCCESS", move |_| {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();

        bus.emit("CAMERA_CAPTURE_SUCCESS", json!({ "uri": "file://a.jpg" }));
        assert_eq!(count.load(Ordering::SeqCst), 3);
        drop(subs);
        assert_eq!(bus.listener_count("CAMERA_CAPTURE_SUCCESS"), 0);
    }

    #[test]
    fn test_clone_shares_registry() {
        let bus = EventBus::new();
        let clone = bus.clone();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let _sub = clone.on("PAGE_READY", move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.emit("PAGE_READY", json!({}));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
