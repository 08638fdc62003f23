//! # Connectivity Monitor
//!
//! Observes online/offline transitions delivered as raw bridge events,
//! maintains the shared connectivity state, and kicks the offline queue
//! whenever connectivity returns.

use crate::queue::OfflineOperationQueue;
use core_runtime::events::{EventBus, Subscription};
use bridge_traits::network::ConnectivityProbe;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Raw bridge event carrying `{ isOnline: bool }`.
pub const CONNECTIVITY_CHANGE: &str = "CONNECTIVITY_CHANGE";

/// Normalized application event re-published for UI layers.
pub const CONNECTIVITY_CHANGED: &str = "connectivityChange";

/// Shared online/offline flag.
///
/// Mutated only by the [`ConnectivityMonitor`]; the offline queue reads it
/// before each flush attempt. Starts optimistic: a wrong `true` costs one
/// failed flush pass that the retry path absorbs, a wrong `false` would park
/// the queue silently.
#[derive(Clone, Debug)]
pub struct ConnectivityState {
    online: Arc<AtomicBool>,
}

impl ConnectivityState {
    pub fn new(initial: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(initial)),
        }
    }

    /// Optimistic initial state.
    pub fn assume_online() -> Self {
        Self::new(true)
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Set the flag, returning the previous value.
    pub fn set_online(&self, online: bool) -> bool {
        self.online.swap(online, Ordering::SeqCst)
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self::assume_online()
    }
}

/// Connectivity observer wired between the bus and the offline queue.
pub struct ConnectivityMonitor {
    bus: EventBus,
    state: ConnectivityState,
    queue: OfflineOperationQueue,
    probe: Option<Arc<dyn ConnectivityProbe>>,
    subscription: Option<Subscription>,
}

impl ConnectivityMonitor {
    pub fn new(
        bus: EventBus,
        state: ConnectivityState,
        queue: OfflineOperationQueue,
        probe: Option<Arc<dyn ConnectivityProbe>>,
    ) -> Self {
        Self {
            bus,
            state,
            queue,
            probe,
            subscription: None,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state.clone()
    }

    pub fn is_online(&self) -> bool {
        self.state.is_online()
    }

    /// Seed the state from the probe and subscribe to change events.
    ///
    /// Each offline→online transition re-publishes a normalized
    /// `connectivityChange` event and triggers a queue flush. Rapid flapping
    /// is harmless: the queue's single-flight guard coalesces the flushes.
    pub async fn start(&mut self) {
        if let Some(probe) = &self.probe {
            let online = probe.is_online().await;
            self.state.set_online(online);
            debug!(online, "Connectivity seeded from probe");
        }

        let state = self.state.clone();
        let bus = self.bus.clone();
        let queue = self.queue.clone();

        self.subscription = Some(self.bus.on(CONNECTIVITY_CHANGE, move |payload| {
            let Some(online) = payload.get("isOnline").and_then(Value::as_bool) else {
                debug!(payload = %payload, "Connectivity event without isOnline flag, ignored");
                return Ok(());
            };

            let was_online = state.set_online(online);
            bus.emit(CONNECTIVITY_CHANGED, json!({ "isOnline": online }));

            if online && !was_online {
                info!("Connectivity restored, flushing offline queue");
                let queue = queue.clone();
                tokio::spawn(async move {
                    let _ = queue.flush().await;
                });
            }
            Ok(())
        }));
    }

    /// Drop the event subscription. Call on teardown.
    pub fn dispose(&mut self) {
        self.subscription.take();
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.dispose();
    }
}
