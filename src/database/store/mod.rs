use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod value;

pub use memory::MemoryStore;
pub use value::{Document, Value};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("document {collection}/{id} already exists")]
    AlreadyExists { collection: String, id: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt document: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Comparison operators supported by single-field filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl FilterOp {
    pub fn matches(self, field_value: Option<&Value>, filter_value: &Value) -> bool {
        let value = match field_value {
            Some(v) => v,
            None => return self == FilterOp::Ne,
        };
        match self {
            FilterOp::Eq => value.loosely_equals(filter_value),
            FilterOp::Ne => !value.loosely_equals(filter_value),
            FilterOp::Lt | FilterOp::Le | FilterOp::Gt | FilterOp::Ge => {
                match value.compare(filter_value) {
                    Some(ordering) => match self {
                        FilterOp::Lt => ordering.is_lt(),
                        FilterOp::Le => ordering.is_le(),
                        FilterOp::Gt => ordering.is_gt(),
                        FilterOp::Ge => ordering.is_ge(),
                        _ => unreachable!(),
                    },
                    None => false,
                }
            }
        }
    }
}

/// One operation inside an atomic [`DocumentStore::batch_write`].
#[derive(Debug, Clone)]
pub enum WriteOp {
    Create {
        collection: String,
        id: String,
        fields: Document,
    },
    Update {
        collection: String,
        id: String,
        patch: Document,
    },
    Upsert {
        collection: String,
        id: String,
        fields: Document,
    },
    Delete {
        collection: String,
        id: String,
    },
}

impl WriteOp {
    pub fn create(collection: &str, doc: Document) -> WriteOp {
        WriteOp::Create {
            collection: collection.to_string(),
            id: doc.id.clone(),
            fields: doc,
        }
    }

    pub fn update(collection: &str, id: &str, patch: Document) -> WriteOp {
        WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            patch,
        }
    }

    pub fn upsert(collection: &str, doc: Document) -> WriteOp {
        WriteOp::Upsert {
            collection: collection.to_string(),
            id: doc.id.clone(),
            fields: doc,
        }
    }

    pub fn delete(collection: &str, id: &str) -> WriteOp {
        WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Typed abstraction over the keyed document store.
///
/// Individual document writes are serialized by the backend; `batch_write`
/// commits all of its operations or none of them. Equality predicates must be
/// handed to `where_field`/`match_all` rather than filtered after an
/// unbounded read.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Bounded scan. `limit` is required; callers that want predicates use
    /// `where_field` or `match_all` instead.
    async fn get_many(&self, collection: &str, limit: usize) -> StoreResult<Vec<Document>>;

    async fn where_field(
        &self,
        collection: &str,
        field: &str,
        op: FilterOp,
        value: Value,
    ) -> StoreResult<Vec<Document>>;

    /// AND-of-equalities over several fields.
    async fn match_all(
        &self,
        collection: &str,
        criteria: &[(&str, Value)],
    ) -> StoreResult<Vec<Document>>;

    /// Fails with [`StoreError::AlreadyExists`] when the id is taken.
    async fn create(&self, collection: &str, doc: Document) -> StoreResult<()>;

    /// Partial patch; fields present in `patch` replace stored values.
    async fn update(&self, collection: &str, id: &str, patch: Document) -> StoreResult<()>;

    async fn upsert(&self, collection: &str, doc: Document) -> StoreResult<()>;

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    async fn delete_many(&self, collection: &str, ids: &[String]) -> StoreResult<()>;

    /// Largest integer value of `id_field` across the collection, 0 if empty.
    async fn max_id(&self, collection: &str, id_field: &str) -> StoreResult<i64>;

    /// Monotonic id allocation: strictly greater than any id this store has
    /// handed out or observed in `id_field`. Safe under concurrent writers.
    async fn next_id(&self, collection: &str, id_field: &str) -> StoreResult<i64>;

    /// Atomic multi-document write.
    async fn batch_write(&self, ops: Vec<WriteOp>) -> StoreResult<()>;

    /// Single-document compare-and-set: applies `fields` iff the current
    /// value of `field` equals `expected` (`None` = document absent).
    /// Returns whether the write applied. The advisory-lock primitive.
    async fn check_and_set(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        expected: Option<Value>,
        fields: Document,
    ) -> StoreResult<bool>;
}
