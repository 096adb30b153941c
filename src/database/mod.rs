use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

pub mod models;
pub mod repositories;
pub mod store;

use store::{Document, DocumentStore, FilterOp, StoreError, StoreResult, Value, WriteOp};

/// Store collection names.
pub mod collections {
    pub const EMPLOYEES: &str = "employees";
    pub const OVERTIME_LOGS: &str = "overtimeLogs";
    pub const CERTIFICATES: &str = "certificates";
    pub const CREDIT_BATCHES: &str = "creditBatches";
    pub const LEDGER: &str = "ledger";
    pub const HOLIDAYS: &str = "holidays";
    pub const CONFIGURATION: &str = "configuration";
    pub const LIBRARIES: &str = "libraries";
    pub const LOCKS: &str = "locks";
}

/// Upper bound for unfiltered scans; the adapter refuses unbounded reads.
pub const SCAN_LIMIT: usize = 10_000;

/// Shared handle to the backing document store.
///
/// Every call runs under the configured deadline; expiry surfaces as
/// [`StoreError::Unavailable`] and commits nothing. Repositories clone this
/// handle the way the request layer clones a pool.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn DocumentStore>,
    deadline: Duration,
}

impl Store {
    pub fn new(backend: Arc<dyn DocumentStore>, deadline: Duration) -> Self {
        Store { backend, deadline }
    }

    /// Fresh store over the bundled in-memory backend.
    pub fn in_memory() -> Self {
        Store::new(Arc::new(store::MemoryStore::new()), Duration::from_secs(5))
    }

    async fn bounded<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Unavailable(format!(
                "store call exceeded deadline of {:?}",
                self.deadline
            ))),
        }
    }

    pub async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.bounded(self.backend.get(collection, id)).await
    }

    pub async fn get_many(&self, collection: &str, limit: usize) -> StoreResult<Vec<Document>> {
        self.bounded(self.backend.get_many(collection, limit)).await
    }

    pub async fn where_field(
        &self,
        collection: &str,
        field: &str,
        op: FilterOp,
        value: Value,
    ) -> StoreResult<Vec<Document>> {
        self.bounded(self.backend.where_field(collection, field, op, value))
            .await
    }

    pub async fn match_all(
        &self,
        collection: &str,
        criteria: &[(&str, Value)],
    ) -> StoreResult<Vec<Document>> {
        self.bounded(self.backend.match_all(collection, criteria))
            .await
    }

    pub async fn create(&self, collection: &str, doc: Document) -> StoreResult<()> {
        self.bounded(self.backend.create(collection, doc)).await
    }

    pub async fn update(&self, collection: &str, id: &str, patch: Document) -> StoreResult<()> {
        self.bounded(self.backend.update(collection, id, patch))
            .await
    }

    pub async fn upsert(&self, collection: &str, doc: Document) -> StoreResult<()> {
        self.bounded(self.backend.upsert(collection, doc)).await
    }

    pub async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.bounded(self.backend.delete(collection, id)).await
    }

    pub async fn delete_many(&self, collection: &str, ids: &[String]) -> StoreResult<()> {
        self.bounded(self.backend.delete_many(collection, ids))
            .await
    }

    pub async fn max_id(&self, collection: &str, id_field: &str) -> StoreResult<i64> {
        self.bounded(self.backend.max_id(collection, id_field)).await
    }

    pub async fn next_id(&self, collection: &str, id_field: &str) -> StoreResult<i64> {
        self.bounded(self.backend.next_id(collection, id_field))
            .await
    }

    pub async fn batch_write(&self, ops: Vec<WriteOp>) -> StoreResult<()> {
        self.bounded(self.backend.batch_write(ops)).await
    }

    pub async fn check_and_set(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        expected: Option<Value>,
        fields: Document,
    ) -> StoreResult<bool> {
        self.bounded(
            self.backend
                .check_and_set(collection, id, field, expected, fields),
        )
        .await
    }
}
