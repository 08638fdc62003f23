use thiserror::Error;

#[derive(Error, Debug)]
pub enum OfflineError {
    #[error("Remote flush failed: {0}")]
    RemoteFlush(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OfflineError>;
