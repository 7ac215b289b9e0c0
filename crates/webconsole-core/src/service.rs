//! ConsoleService - process-wide wiring
//!
//! Built once at startup and shared by every request handler and CLI
//! command.

use crate::exporter::StreamingExporter;
use crate::registry::ExecutionRegistry;
use crate::runner::{CommandRunner, RunnerConfig};
use std::sync::Arc;
use webconsole_store::ExecutionStoreTrait;

/// Store, registry, runner and exporter of one process
pub struct ConsoleService {
    store: Arc<dyn ExecutionStoreTrait>,
    registry: Arc<ExecutionRegistry>,
    runner: CommandRunner,
    exporter: StreamingExporter,
}

impl ConsoleService {
    /// Wire up a service around a store
    pub fn new(store: Arc<dyn ExecutionStoreTrait>, runner_config: RunnerConfig) -> Self {
        let registry = Arc::new(ExecutionRegistry::new());
        Self {
            runner: CommandRunner::new(store.clone(), registry.clone(), runner_config),
            exporter: StreamingExporter::new(registry.clone()),
            store,
            registry,
        }
    }

    /// Persistent record store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ExecutionStoreTrait> {
        &self.store
    }

    /// Live execution directory
    #[must_use]
    pub fn registry(&self) -> &Arc<ExecutionRegistry> {
        &self.registry
    }

    /// Command runner
    #[must_use]
    pub fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    /// Viewer attachment
    #[must_use]
    pub fn exporter(&self) -> &StreamingExporter {
        &self.exporter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::{ChannelSink, ConsoleFrame};
    use crate::test_support::wait_for_finish;
    use webconsole_store::ExecutionStore;

    #[tokio::test]
    async fn test_components_share_one_registry() {
        let store = Arc::new(ExecutionStore::in_memory().await.unwrap());
        let service = ConsoleService::new(store, RunnerConfig::default());

        let id = service.runner().start("sleep 0.3; echo shared").await.unwrap();
        assert!(service.registry().lookup(id).await.is_some());

        let (sink, mut rx) = ChannelSink::new(8);
        let _attachment = service.exporter().attach(id, sink).await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(ConsoleFrame::Output("shared\n".to_string()))
        );

        let record = wait_for_finish(service.store().as_ref(), id).await;
        assert_eq!(record.output, b"shared\n");
        assert_eq!(service.store().name(), "sqlite");
    }
}
