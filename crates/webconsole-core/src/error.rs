//! Error types for webconsole-core

use crate::bus::BusError;
use webconsole_store::ExecutionId;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Submitted command text was empty
    #[error("command must not be empty")]
    EmptyCommand,

    /// No live execution with this identifier (never existed or already finished)
    #[error("execution not found: {0}")]
    NotFound(ExecutionId),

    /// Identifier already has a registered bus
    #[error("execution already registered: {0}")]
    DuplicateExecution(ExecutionId),

    /// Subprocess could not be started
    #[error("failed to spawn command: {0}")]
    Spawn(String),

    /// Outbound transport cannot flush frames independently of completion
    #[error("transport does not support incremental delivery")]
    NotIncremental,

    /// Bus rejected an operation
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    /// Persistence error
    #[error("store error: {0}")]
    Store(#[from] webconsole_store::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
