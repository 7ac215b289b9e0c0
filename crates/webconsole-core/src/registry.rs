//! ExecutionRegistry - directory of live executions
//!
//! Maps an execution id to its bus for exactly as long as the subprocess is
//! running. The registry lock is exposed through [`RegistryGuard`] so the
//! runner can hold it across record creation, subprocess start and
//! registration: no other submitter or viewer observes the half-built state.

use crate::bus::ConsoleBus;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use webconsole_store::ExecutionId;

/// Live execution directory
#[derive(Default)]
pub struct ExecutionRegistry {
    buses: Mutex<HashMap<ExecutionId, Arc<ConsoleBus>>>,
}

/// Exclusive access to the registry
pub struct RegistryGuard<'a> {
    buses: MutexGuard<'a, HashMap<ExecutionId, Arc<ConsoleBus>>>,
}

impl RegistryGuard<'_> {
    /// Register the bus of a live execution
    pub fn register(&mut self, id: ExecutionId, bus: Arc<ConsoleBus>) -> Result<()> {
        if self.buses.contains_key(&id) {
            return Err(Error::DuplicateExecution(id));
        }
        self.buses.insert(id, bus);
        debug!(execution_id = id, "Registered live execution");
        Ok(())
    }

    /// Find the bus of a live execution
    #[must_use]
    pub fn lookup(&self, id: ExecutionId) -> Option<Arc<ConsoleBus>> {
        self.buses.get(&id).cloned()
    }

    /// Remove an execution; a no-op if it is not registered
    pub fn unregister(&mut self, id: ExecutionId) -> Option<Arc<ConsoleBus>> {
        let removed = self.buses.remove(&id);
        if removed.is_some() {
            debug!(execution_id = id, "Unregistered execution");
        }
        removed
    }

    /// Number of live executions
    #[must_use]
    pub fn len(&self) -> usize {
        self.buses.len()
    }

    /// Whether no execution is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }
}

impl ExecutionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the registry lock
    pub async fn lock(&self) -> RegistryGuard<'_> {
        RegistryGuard {
            buses: self.buses.lock().await,
        }
    }

    /// Find the bus of a live execution
    pub async fn lookup(&self, id: ExecutionId) -> Option<Arc<ConsoleBus>> {
        self.lock().await.lookup(id)
    }

    /// Remove an execution and close its bus
    ///
    /// The bus is closed while the lock is still held, so a viewer can never
    /// look up a bus that is about to be released.
    pub async fn unregister_and_close(&self, id: ExecutionId) {
        let mut guard = self.lock().await;
        if let Some(bus) = guard.unregister(id) {
            bus.close().await;
        }
    }

    /// Number of live executions
    pub async fn len(&self) -> usize {
        self.lock().await.len()
    }

    /// Whether no execution is live
    pub async fn is_empty(&self) -> bool {
        self.lock().await.is_empty()
    }
}
