//! # Task Service
//!
//! The task mutation flows. Every write lands in the local cache first,
//! then an operation is enqueued for the remote store and a background
//! flush is kicked off; flush failures never surface here — the offline
//! queue retries them.

use crate::error::{Result, TaskError};
use crate::model::{Task, TaskChanges, TaskDraft};
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::Clock;
use core_offline::{OfflineOperationQueue, QueuedOperation};
use core_runtime::events::EventBus;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Storage key the task cache persists under.
pub const TASKS_STORAGE_KEY: &str = "snap_tasks";

/// Application event: a task was created.
pub const TASK_CREATED: &str = "TASK_CREATED";

/// Application event: a task was updated.
pub const TASK_UPDATED: &str = "TASK_UPDATED";

/// Application event: a task's completion flag was toggled.
pub const TASK_COMPLETED: &str = "TASK_COMPLETED";

/// Application event: a task was deleted.
pub const TASK_DELETED: &str = "TASK_DELETED";

/// Application event: the task cache was loaded.
pub const TASKS_LOADED: &str = "TASKS_LOADED";

/// Application event: any task data changed; list screens re-render on it.
pub const DATA_CHANGED: &str = "DATA_CHANGED";

pub struct TaskService {
    storage: Arc<dyn KeyValueStore>,
    queue: OfflineOperationQueue,
    bus: EventBus,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        queue: OfflineOperationQueue,
        bus: EventBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            queue,
            bus,
            clock,
        }
    }

    /// Load the cached task list.
    ///
    /// Missing or corrupt cache data degrades to an empty list; losing the
    /// cache must never brick the list screen.
    pub async fn load_tasks(&self) -> Result<Vec<Task>> {
        let tasks = self.read_cache().await?;
        self.bus.emit(TASKS_LOADED, json!({ "count": tasks.len() }));
        Ok(tasks)
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.read_cache().await?.into_iter().find(|t| t.id == id))
    }

    /// Create a task: cache it, queue the remote create, kick a flush.
    pub async fn create_task(&self, draft: TaskDraft) -> Result<Task> {
        let task = Task::new(draft, self.clock.as_ref())?;

        let mut tasks = self.read_cache().await?;
        tasks.push(task.clone());
        self.write_cache(&tasks).await?;

        self.queue
            .enqueue(QueuedOperation::create(
                &task.id,
                serde_json::to_value(&task)?,
                self.clock.as_ref(),
            ))
            .await?;

        info!(task_id = %task.id, "Task created");
        self.bus.emit(TASK_CREATED, json!({ "taskId": task.id }));
        self.bus
            .emit(DATA_CHANGED, json!({ "type": "task", "action": "create" }));
        self.flush_in_background();

        Ok(task)
    }

    /// Apply `changes` to a cached task and queue the remote update.
    pub async fn update_task(&self, id: &str, changes: TaskChanges) -> Result<Task> {
        let mut tasks = self.read_cache().await?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound { id: id.to_string() })?;

        changes.apply(task)?;
        task.updated_at = self.clock.now();
        let updated = task.clone();
        self.write_cache(&tasks).await?;

        self.queue
            .enqueue(QueuedOperation::update(
                id,
                serde_json::to_value(&updated)?,
                self.clock.as_ref(),
            ))
            .await?;

        self.bus.emit(TASK_UPDATED, json!({ "taskId": id }));
        self.bus
            .emit(DATA_CHANGED, json!({ "type": "task", "action": "update" }));
        self.flush_in_background();

        Ok(updated)
    }

    /// Flip a task's completion flag.
    pub async fn toggle_completed(&self, id: &str) -> Result<Task> {
        let mut tasks = self.read_cache().await?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound { id: id.to_string() })?;

        task.completed = !task.completed;
        task.updated_at = self.clock.now();
        let toggled = task.clone();
        self.write_cache(&tasks).await?;

        self.queue
            .enqueue(QueuedOperation::update(
                id,
                serde_json::to_value(&toggled)?,
                self.clock.as_ref(),
            ))
            .await?;

        self.bus.emit(
            TASK_COMPLETED,
            json!({ "taskId": id, "completed": toggled.completed }),
        );
        self.bus
            .emit(DATA_CHANGED, json!({ "type": "task", "action": "toggle" }));
        self.flush_in_background();

        Ok(toggled)
    }

    /// Delete a task from the cache and the remote store.
    ///
    /// Queued operations still referencing the task are invalidated by the
    /// queued delete.
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let mut tasks = self.read_cache().await?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(TaskError::NotFound { id: id.to_string() });
        }
        self.write_cache(&tasks).await?;

        self.queue
            .enqueue(QueuedOperation::delete(id, self.clock.as_ref()))
            .await?;

        info!(task_id = %id, "Task deleted");
        self.bus.emit(TASK_DELETED, json!({ "taskId": id }));
        self.bus
            .emit(DATA_CHANGED, json!({ "type": "task", "action": "delete" }));
        self.flush_in_background();

        Ok(())
    }

    fn flush_in_background(&self) {
        let queue = self.queue.clone();
        tokio::spawn(async move {
            // Offline and coalesced outcomes are normal here; real failures
            // schedule their own retries inside the queue.
            let _ = queue.flush().await;
        });
    }

    async fn read_cache(&self) -> Result<Vec<Task>> {
        let raw = self
            .storage
            .read(TASKS_STORAGE_KEY)
            .await
            .map_err(|e| TaskError::Storage(e.to_string()))?;

        match raw {
            None => Ok(Vec::new()),
            Some(json) => match serde_json::from_str(&json) {
                Ok(tasks) => Ok(tasks),
                Err(error) => {
                    warn!(error = %error, "Task cache corrupt, starting empty");
                    Ok(Vec::new())
                }
            },
        }
    }

    async fn write_cache(&self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string(tasks)?;
        debug!(count = tasks.len(), "Persisting task cache");
        self.storage
            .save(TASKS_STORAGE_KEY, &json)
            .await
            .map_err(|e| TaskError::Storage(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_local::MemoryKeyValueStore;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::remote::RemoteStore;
    use bridge_traits::time::SystemClock;
    use core_offline::{ConnectivityState, OperationType, QueueConfig};
    use serde_json::Value;

    /// Remote that accepts everything; these tests assert on the queue, not
    /// on remote application.
    struct AcceptingRemote;

    #[async_trait]
    impl RemoteStore for AcceptingRemote {
        async fn create(&self, _c: &str, _id: &str, _d: Value) -> BridgeResult<()> {
            Ok(())
        }
        async fn update(&self, _c: &str, _id: &str, _d: Value) -> BridgeResult<()> {
            Ok(())
        }
        async fn delete(&self, _c: &str, _id: &str) -> BridgeResult<()> {
            Ok(())
        }
        async fn exists(&self, _c: &str, _id: &str) -> BridgeResult<bool> {
            Ok(false)
        }
    }

    fn service_offline() -> (TaskService, OfflineOperationQueue, EventBus) {
        let bus = EventBus::new();
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        // Offline: flushes are no-ops, so the queue contents stay observable.
        let queue = OfflineOperationQueue::new(
            QueueConfig::default(),
            Arc::clone(&storage),
            Arc::new(AcceptingRemote),
            ConnectivityState::new(false),
            bus.clone(),
        );
        let service = TaskService::new(
            storage,
            queue.clone(),
            bus.clone(),
            Arc::new(SystemClock),
        );
        (service, queue, bus)
    }

    #[tokio::test]
    async fn test_create_task_caches_and_queues() {
        let (service, queue, _bus) = service_offline();

        let task = service
            .create_task(TaskDraft::new("Buy milk").with_description("two liters"))
            .await
            .unwrap();

        let cached = service.load_tasks().await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0], task);

        let pending = queue.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].op, OperationType::Create);
        assert_eq!(pending[0].entity_id, task.id);
        assert_eq!(pending[0].payload["title"], "Buy milk");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_title() {
        let (service, queue, _bus) = service_offline();

        assert!(matches!(
            service.create_task(TaskDraft::new("  ")).await,
            Err(TaskError::EmptyTitle)
        ));
        assert!(queue.is_empty().await.unwrap());
        assert!(service.load_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_task_bumps_timestamp_and_queues() {
        let (service, queue, _bus) = service_offline();
        let task = service.create_task(TaskDraft::new("Original")).await.unwrap();

        let updated = service
            .update_task(&task.id, TaskChanges::default().title("Renamed"))
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert!(updated.updated_at >= task.updated_at);

        let pending = queue.pending().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[1].op, OperationType::Update);
        assert_eq!(pending[1].payload["title"], "Renamed");
    }

    #[tokio::test]
    async fn test_update_missing_task_is_not_found() {
        let (service, _queue, _bus) = service_offline();
        assert!(matches!(
            service.update_task("ghost", TaskChanges::default()).await,
            Err(TaskError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_toggle_flips_completion() {
        let (service, _queue, _bus) = service_offline();
        let task = service.create_task(TaskDraft::new("Toggle me")).await.unwrap();

        let toggled = service.toggle_completed(&task.id).await.unwrap();
        assert!(toggled.completed);
        let toggled_back = service.toggle_completed(&task.id).await.unwrap();
        assert!(!toggled_back.completed);
    }

    #[tokio::test]
    async fn test_delete_removes_cache_and_invalidates_queue() {
        let (service, queue, _bus) = service_offline();
        let task = service.create_task(TaskDraft::new("Doomed")).await.unwrap();

        service.delete_task(&task.id).await.unwrap();

        assert!(service.load_tasks().await.unwrap().is_empty());

        // The queued create was superseded; only the delete remains.
        let pending = queue.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].op, OperationType::Delete);
        assert_eq!(pending[0].entity_id, task.id);
    }

    #[tokio::test]
    async fn test_delete_missing_task_is_not_found() {
        let (service, _queue, _bus) = service_offline();
        assert!(matches!(
            service.delete_task("ghost").await,
            Err(TaskError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_corrupt_cache_degrades_to_empty() {
        let bus = EventBus::new();
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        storage.save(TASKS_STORAGE_KEY, "not json at all").await.unwrap();

        let queue = OfflineOperationQueue::new(
            QueueConfig::default(),
            Arc::clone(&storage),
            Arc::new(AcceptingRemote),
            ConnectivityState::new(false),
            bus.clone(),
        );
        let service = TaskService::new(storage, queue, bus, Arc::new(SystemClock));

        assert!(service.load_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mutation_events_published() {
        let (service, _queue, bus) = service_offline();

        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let subs: Vec<_> = [TASK_CREATED, TASK_UPDATED, TASK_DELETED, DATA_CHANGED]
            .iter()
            .map(|name| {
                let events = Arc::clone(&events);
                let name = name.to_string();
                bus.on(&name.clone(), move |_| {
                    events.lock().unwrap().push(name.clone());
                    Ok(())
                })
            })
            .collect();

        let task = service.create_task(TaskDraft::new("Eventful")).await.unwrap();
        service
            .update_task(&task.id, TaskChanges::default().description("d"))
            .await
            .unwrap();
        service.delete_task(&task.id).await.unwrap();
        drop(subs);

        let seen = events.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                TASK_CREATED.to_string(),
                DATA_CHANGED.to_string(),
                TASK_UPDATED.to_string(),
                DATA_CHANGED.to_string(),
                TASK_DELETED.to_string(),
                DATA_CHANGED.to_string(),
            ]
        );
    }
}
