use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::value::{Document, Value};
use super::{DocumentStore, FilterOp, StoreError, StoreResult, WriteOp};

type Collection = BTreeMap<String, BTreeMap<String, Value>>;

/// In-memory document store backend.
///
/// One writer lock serializes every mutation, which makes `batch_write`
/// all-or-nothing and `next_id`/`check_and_set` atomic. Reads share the lock.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    counters: RwLock<HashMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn to_document(id: &str, fields: &BTreeMap<String, Value>) -> Document {
        Document {
            id: id.to_string(),
            fields: fields.clone(),
        }
    }

    fn apply(collections: &mut HashMap<String, Collection>, op: &WriteOp) -> StoreResult<()> {
        match op {
            WriteOp::Create {
                collection,
                id,
                fields,
            } => {
                let coll = collections.entry(collection.clone()).or_default();
                if coll.contains_key(id) {
                    return Err(StoreError::AlreadyExists {
                        collection: collection.clone(),
                        id: id.clone(),
                    });
                }
                coll.insert(id.clone(), fields.fields.clone());
            }
            WriteOp::Update {
                collection,
                id,
                patch,
            } => {
                let existing = collections
                    .get_mut(collection)
                    .and_then(|coll| coll.get_mut(id))
                    .ok_or_else(|| StoreError::NotFound {
                        collection: collection.clone(),
                        id: id.clone(),
                    })?;
                for (field, value) in &patch.fields {
                    existing.insert(field.clone(), value.clone());
                }
            }
            WriteOp::Upsert {
                collection,
                id,
                fields,
            } => {
                collections
                    .entry(collection.clone())
                    .or_default()
                    .insert(id.clone(), fields.fields.clone());
            }
            WriteOp::Delete { collection, id } => {
                let coll = collections
                    .get_mut(collection)
                    .ok_or_else(|| StoreError::NotFound {
                        collection: collection.clone(),
                        id: id.clone(),
                    })?;
                coll.remove(id).ok_or_else(|| StoreError::NotFound {
                    collection: collection.clone(),
                    id: id.clone(),
                })?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|coll| coll.get(id))
            .map(|fields| Self::to_document(id, fields)))
    }

    async fn get_many(&self, collection: &str, limit: usize) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|coll| {
                coll.iter()
                    .take(limit)
                    .map(|(id, fields)| Self::to_document(id, fields))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn where_field(
        &self,
        collection: &str,
        field: &str,
        op: FilterOp,
        value: Value,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|coll| {
                coll.iter()
                    .filter(|(_, fields)| op.matches(fields.get(field), &value))
                    .map(|(id, fields)| Self::to_document(id, fields))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn match_all(
        &self,
        collection: &str,
        criteria: &[(&str, Value)],
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|coll| {
                coll.iter()
                    .filter(|(_, fields)| {
                        criteria
                            .iter()
                            .all(|(field, value)| FilterOp::Eq.matches(fields.get(*field), value))
                    })
                    .map(|(id, fields)| Self::to_document(id, fields))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(&self, collection: &str, doc: Document) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        Self::apply(&mut collections, &WriteOp::create(collection, doc))
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        Self::apply(&mut collections, &WriteOp::update(collection, id, patch))
    }

    async fn upsert(&self, collection: &str, doc: Document) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        Self::apply(&mut collections, &WriteOp::upsert(collection, doc))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        Self::apply(&mut collections, &WriteOp::delete(collection, id))
    }

    async fn delete_many(&self, collection: &str, ids: &[String]) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        for id in ids {
            Self::apply(&mut collections, &WriteOp::delete(collection, id))?;
        }
        Ok(())
    }

    async fn max_id(&self, collection: &str, id_field: &str) -> StoreResult<i64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|coll| {
                coll.values()
                    .filter_map(|fields| match fields.get(id_field) {
                        Some(Value::Int(n)) => Some(*n),
                        Some(Value::Str(s)) => s.parse::<i64>().ok(),
                        _ => None,
                    })
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0))
    }

    async fn next_id(&self, collection: &str, id_field: &str) -> StoreResult<i64> {
        // Counter and scan both run while holding the counter writer lock, so
        // two concurrent callers can never observe the same id.
        let mut counters = self.counters.write().await;
        let observed = self.max_id(collection, id_field).await?;
        let counter = counters.entry(collection.to_string()).or_insert(0);
        let next = observed.max(*counter) + 1;
        *counter = next;
        Ok(next)
    }

    async fn batch_write(&self, ops: Vec<WriteOp>) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        // Stage on a copy so a failing op leaves the store untouched.
        let mut staged = collections.clone();
        for op in &ops {
            Self::apply(&mut staged, op)?;
        }
        *collections = staged;
        Ok(())
    }

    async fn check_and_set(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        expected: Option<Value>,
        fields: Document,
    ) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let current = collections
            .get(collection)
            .and_then(|coll| coll.get(id))
            .and_then(|doc| doc.get(field))
            .cloned();
        let holds = match (&current, &expected) {
            (None, None) => true,
            (Some(value), Some(wanted)) => value.loosely_equals(wanted),
            _ => false,
        };
        if !holds {
            return Ok(false);
        }
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields.fields);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, field: &str, value: impl Into<Value>) -> Document {
        Document::new(id).with(field, value)
    }

    #[tokio::test]
    async fn create_refuses_existing_id() {
        let store = MemoryStore::new();
        store
            .create("employees", doc("e1", "email", "a@b"))
            .await
            .unwrap();
        let err = store
            .create("employees", doc("e1", "email", "c@d"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn update_patches_only_named_fields() {
        let store = MemoryStore::new();
        store
            .create(
                "overtimeLogs",
                Document::new("1")
                    .with("status", "Uncertified")
                    .with("year", 2025),
            )
            .await
            .unwrap();
        store
            .update("overtimeLogs", "1", doc("1", "status", "Active"))
            .await
            .unwrap();
        let fetched = store.get("overtimeLogs", "1").await.unwrap().unwrap();
        assert_eq!(fetched.get("status"), Some(&Value::Str("Active".into())));
        assert_eq!(fetched.get("year"), Some(&Value::Int(2025)));
    }

    #[tokio::test]
    async fn batch_write_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.create("ledger", doc("t1", "hours", 5.0)).await.unwrap();
        let err = store
            .batch_write(vec![
                WriteOp::create("ledger", doc("t2", "hours", 1.0)),
                // Duplicate id fails the whole batch.
                WriteOp::create("ledger", doc("t1", "hours", 2.0)),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert!(store.get("ledger", "t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn where_field_supports_range_ops() {
        let store = MemoryStore::new();
        for (id, year) in [("h1", 2024), ("h2", 2025), ("h3", 2026)] {
            store.create("holidays", doc(id, "year", year)).await.unwrap();
        }
        let hits = store
            .where_field("holidays", "year", FilterOp::Ge, Value::Int(2025))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn next_id_is_strictly_increasing_and_respects_existing_rows() {
        let store = MemoryStore::new();
        store
            .create("overtimeLogs", doc("41", "logId", "41"))
            .await
            .unwrap();
        assert_eq!(store.next_id("overtimeLogs", "logId").await.unwrap(), 42);
        assert_eq!(store.next_id("overtimeLogs", "logId").await.unwrap(), 43);
    }

    #[tokio::test]
    async fn check_and_set_applies_only_on_expected_state() {
        let store = MemoryStore::new();
        let acquired = store
            .check_and_set(
                "locks",
                "debit:e1",
                "owner",
                None,
                doc("debit:e1", "owner", "a"),
            )
            .await
            .unwrap();
        assert!(acquired);
        let stolen = store
            .check_and_set(
                "locks",
                "debit:e1",
                "owner",
                None,
                doc("debit:e1", "owner", "b"),
            )
            .await
            .unwrap();
        assert!(!stolen);
        let released = store
            .check_and_set(
                "locks",
                "debit:e1",
                "owner",
                Some(Value::Str("a".into())),
                doc("debit:e1", "owner", "c"),
            )
            .await
            .unwrap();
        assert!(released);
    }
}
