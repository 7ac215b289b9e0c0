//! Helpers shared by the unit tests of this crate

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use webconsole_store::{
    Error as StoreError, ExecutionId, ExecutionRecord, ExecutionStore, ExecutionStoreTrait,
    Result as StoreResult,
};

/// Poll the store until the record is finished
pub(crate) async fn wait_for_finish(
    store: &dyn ExecutionStoreTrait,
    id: ExecutionId,
) -> ExecutionRecord {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Some(record) = store.get(id).await.unwrap() {
                if record.is_finished() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("execution did not finish in time")
}

/// Store whose `finish` always fails
pub(crate) struct FailingFinishStore {
    inner: ExecutionStore,
    finish_called: Arc<Notify>,
}

#[async_trait::async_trait]
impl ExecutionStoreTrait for FailingFinishStore {
    async fn create_pending(&self, command: &str) -> StoreResult<ExecutionId> {
        self.inner.create_pending(command).await
    }

    async fn finish(&self, _id: ExecutionId, _status: i32, _output: &[u8]) -> StoreResult<()> {
        self.finish_called.notify_one();
        Err(StoreError::Database("disk I/O error".to_string()))
    }

    async fn get(&self, id: ExecutionId) -> StoreResult<Option<ExecutionRecord>> {
        self.inner.get(id).await
    }

    async fn list_recent(&self, limit: i64) -> StoreResult<Vec<ExecutionRecord>> {
        self.inner.list_recent(limit).await
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// A failing store and the notification fired when `finish` is attempted
pub(crate) async fn failing_finish_store() -> (Arc<FailingFinishStore>, Arc<Notify>) {
    let finish_called = Arc::new(Notify::new());
    let store = FailingFinishStore {
        inner: ExecutionStore::in_memory().await.unwrap(),
        finish_called: finish_called.clone(),
    };
    (Arc::new(store), finish_called)
}
