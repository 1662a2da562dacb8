use thiserror::Error;

/// Errors from memory graph operations.
///
/// Only programmer errors surface here. Not-found conditions are `Option`
/// or `bool` results, and persistence failures are logged, not returned.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from key-value persistence (used by the `KvStore` trait in relmem-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),
}

impl From<RepositoryError> for MemoryError {
    fn from(e: RepositoryError) -> Self {
        MemoryError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for MemoryError {
    fn from(e: serde_json::Error) -> Self {
        MemoryError::Serialization(e.to_string())
    }
}
