//! Webconsole Store - execution record persistence
//!
//! This crate provides the persistence collaborator for webconsole:
//! - Record: the execution record and its lifecycle state
//! - Store: SQLite storage and the `ExecutionStoreTrait` seam

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod record;
pub mod store;

pub use error::{Error, Result};
pub use record::{ExecutionId, ExecutionRecord, ExecutionState, UNKNOWN_EXIT_CODE};
pub use store::{
    default_data_dir, default_db_path, ExecutionStore, ExecutionStoreTrait, DB_FILE_NAME,
};
