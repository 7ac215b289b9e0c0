//! Trait for execution record storage backends

use crate::error::Result;
use crate::record::{ExecutionId, ExecutionRecord};

/// Trait for execution record storage backends
///
/// The runner and the HTTP layer only see this seam, so the SQLite store can
/// be swapped for another implementation (or a failing one in tests).
#[async_trait::async_trait]
pub trait ExecutionStoreTrait: Send + Sync {
    /// Persist a pending record and return its newly issued identifier
    async fn create_pending(&self, command: &str) -> Result<ExecutionId>;

    /// Write the final status and output of a pending record in one transaction
    async fn finish(&self, id: ExecutionId, status: i32, output: &[u8]) -> Result<()>;

    /// Fetch a record, `None` if the identifier was never issued
    async fn get(&self, id: ExecutionId) -> Result<Option<ExecutionRecord>>;

    /// Most recent records, newest first
    async fn list_recent(&self, limit: i64) -> Result<Vec<ExecutionRecord>>;

    /// Get the store name (for logging)
    fn name(&self) -> &str;
}
