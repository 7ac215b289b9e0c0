//! Store - execution record persistence using SQLite
//!
//! This module provides the storage layer for execution records.
//! It uses sqlx for async SQLite access (embedded, no server required).

mod execution_store;
mod helpers;
mod traits;


pub use execution_store::ExecutionStore;
pub use helpers::{default_data_dir, default_db_path, DB_FILE_NAME};
pub use traits::ExecutionStoreTrait;
