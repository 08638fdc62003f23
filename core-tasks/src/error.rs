use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error("Task {id} not found")]
    NotFound { id: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Offline queue error: {0}")]
    Offline(#[from] core_offline::OfflineError),
}

pub type Result<T> = std::result::Result<T, TaskError>;
