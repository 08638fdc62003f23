//! # Task Module
//!
//! The task domain: the `Task` model in its host wire shape and the
//! `TaskService` flows (load, create, update, toggle, delete) wired to the
//! storage facade and the offline operation queue.

pub mod error;
pub mod model;
pub mod service;

pub use error::{Result, TaskError};
pub use model::{Task, TaskChanges, TaskDraft};
pub use service::{
    TaskService, DATA_CHANGED, TASKS_LOADED, TASKS_STORAGE_KEY, TASK_COMPLETED, TASK_CREATED,
    TASK_DELETED, TASK_UPDATED,
};
