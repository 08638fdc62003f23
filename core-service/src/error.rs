use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
