//! Error types for webconsole-store

use thiserror::Error;

/// Store error type
#[derive(Debug, Error)]
pub enum Error {
    /// Execution not found
    #[error("execution not found: {0}")]
    ExecutionNotFound(i64),

    /// Execution was already finished; finished records are immutable
    #[error("execution already finished: {0}")]
    AlreadyFinished(i64),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
