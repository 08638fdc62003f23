//! # SnapTask Core Service
//!
//! The facade host applications embed. Constructs and wires every core
//! component from a [`CoreConfig`] and owns the init/teardown lifecycle.
//!
//! ## Overview
//!
//! ```text
//!  platform shell ──dispatch_bridge_event──> EventBus
//!        │                                     │
//!        │ invoke/ack                          │ result events
//!        v                                     v
//!   HostBridge <── NativeInvoker <── CorrelationWaiter
//!                       │                      │
//!                StorageFacade          CameraService / PermissionGate
//!                       │
//!            OfflineOperationQueue <── ConnectivityMonitor
//!                       │
//!                  TaskService
//! ```
//!
//! The platform shell forwards every host event into the core via
//! [`SnapTaskCore::dispatch_bridge_event`]; everything else is pull-based
//! through the accessors.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use core_service::SnapTaskCore;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .host_bridge(Arc::new(platform_bridge))
//!     .build()?;
//! let core = SnapTaskCore::new(config).await?;
//!
//! let task = core.tasks().create_task(draft).await?;
//! core.shutdown().await;
//! ```

pub mod error;

pub use error::{Result, ServiceError};

use bridge_traits::remote::RemoteStore;
use bridge_traits::storage::KeyValueStore;
use core_bridge::{
    CameraService, CorrelationWaiter, HostRemoteStore, NativeInvoker, NavigationFacade,
    PermissionGate, StorageFacade,
};
use core_offline::{
    ConnectivityMonitor, ConnectivityState, OfflineOperationQueue, QueueConfig,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use core_tasks::TaskService;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// The assembled SnapTask core.
///
/// Construct once at startup, call [`shutdown`](Self::shutdown) on
/// teardown; shutdown removes the connectivity subscription and cancels
/// pending queue retry timers.
pub struct SnapTaskCore {
    bus: EventBus,
    connectivity: ConnectivityState,
    invoker: Arc<NativeInvoker>,
    storage: Arc<StorageFacade>,
    navigation: Arc<NavigationFacade>,
    permissions: Arc<PermissionGate>,
    camera: Arc<CameraService>,
    queue: OfflineOperationQueue,
    monitor: Mutex<ConnectivityMonitor>,
    tasks: Arc<TaskService>,
}

impl SnapTaskCore {
    /// Wire the core from its configuration and start the connectivity
    /// monitor.
    pub async fn new(config: CoreConfig) -> Result<Self> {
        let bus = EventBus::new();
        let connectivity = ConnectivityState::assume_online();

        let invoker = Arc::new(NativeInvoker::new(
            Arc::clone(&config.host_bridge),
            config.invoke_timeout,
        ));
        let waiter = Arc::new(CorrelationWaiter::new(bus.clone()));

        let storage = Arc::new(StorageFacade::new(
            Arc::clone(&invoker),
            Arc::clone(&config.local_store),
        ));

        let remote: Arc<dyn RemoteStore> = match &config.remote_store {
            Some(remote) => Arc::clone(remote),
            None => Arc::new(HostRemoteStore::new(Arc::clone(&invoker))),
        };

        let queue = OfflineOperationQueue::new(
            QueueConfig {
                collection: config.task_collection.clone(),
                backoff: config.flush_backoff,
                ..QueueConfig::default()
            },
            Arc::clone(&storage) as Arc<dyn KeyValueStore>,
            remote,
            connectivity.clone(),
            bus.clone(),
        );

        let mut monitor = ConnectivityMonitor::new(
            bus.clone(),
            connectivity.clone(),
            queue.clone(),
            config.connectivity_probe.clone(),
        );
        monitor.start().await;

        let permissions = Arc::new(PermissionGate::new(
            Arc::clone(&invoker),
            Arc::clone(&waiter),
            Arc::clone(&config.capture_fallback),
            config.permission_timeout,
        ));

        let camera = Arc::new(CameraService::new(
            Arc::clone(&invoker),
            Arc::clone(&waiter),
            Arc::clone(&permissions),
            Arc::clone(&config.capture_fallback),
            bus.clone(),
            config.capture_timeout,
        ));

        let navigation = Arc::new(NavigationFacade::new(
            Arc::clone(&invoker),
            Arc::clone(&config.router),
            bus.clone(),
        ));

        let tasks = Arc::new(TaskService::new(
            Arc::clone(&storage) as Arc<dyn KeyValueStore>,
            queue.clone(),
            bus.clone(),
            Arc::clone(&config.clock),
        ));

        info!(
            bridge_available = invoker.is_available(),
            "SnapTask core initialized"
        );

        Ok(Self {
            bus,
            connectivity,
            invoker,
            storage,
            navigation,
            permissions,
            camera,
            queue,
            monitor: Mutex::new(monitor),
            tasks,
        })
    }

    /// The bus host events and application events flow through.
    pub fn events(&self) -> EventBus {
        self.bus.clone()
    }

    /// Entry point for the platform shell: forward a host event into the
    /// core. Returns the number of handlers that saw it.
    pub fn dispatch_bridge_event(&self, name: &str, payload: Value) -> usize {
        self.bus.emit(name, payload)
    }

    pub fn tasks(&self) -> Arc<TaskService> {
        Arc::clone(&self.tasks)
    }

    pub fn camera(&self) -> Arc<CameraService> {
        Arc::clone(&self.camera)
    }

    pub fn permissions(&self) -> Arc<PermissionGate> {
        Arc::clone(&self.permissions)
    }

    pub fn navigation(&self) -> Arc<NavigationFacade> {
        Arc::clone(&self.navigation)
    }

    pub fn storage(&self) -> Arc<StorageFacade> {
        Arc::clone(&self.storage)
    }

    pub fn queue(&self) -> OfflineOperationQueue {
        self.queue.clone()
    }

    pub fn is_bridge_available(&self) -> bool {
        self.invoker.is_available()
    }

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Tear the core down: drop the connectivity subscription and cancel
    /// pending flush retries.
    pub async fn shutdown(&self) {
        self.monitor.lock().await.dispose();
        self.queue.dispose();
        info!("SnapTask core shut down");
    }
}
