//! In-memory object-store database.
//!
//! Mirrors the semantics repositories expect from an IndexedDB-style engine:
//! named stores declared up front, a key field per store, optional generated
//! integer keys starting at 1, and insertion-ordered enumeration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use store_core::{BackendError, RecordValue, StoreBackend, StoreRecord, UpdateRecord};
use tokio::sync::RwLock;
use tracing::info;

use crate::schema::StoreSchema;

/// Contents of one object store.
#[derive(Debug)]
struct StoreData {
    key_field: String,
    auto_increment: bool,
    records: Vec<RecordValue>,
    next_key: u64,
}

impl StoreData {
    fn new(schema: &StoreSchema) -> Self {
        Self {
            key_field: schema.key_field.clone(),
            auto_increment: schema.auto_increment,
            records: Vec::new(),
            next_key: 1,
        }
    }

    /// Key held by a record, `None` when the key field is absent or null.
    fn key_of(&self, record: &RecordValue) -> Option<RecordValue> {
        match record.get(self.key_field.as_str()) {
            Some(RecordValue::Null) | None => None,
            Some(value) => Some(value.clone()),
        }
    }

    fn position_of(&self, key: &RecordValue) -> Option<usize> {
        self.records
            .iter()
            .position(|record| self.key_of(record).as_ref() == Some(key))
    }

    /// Keeps the generator ahead of explicit integer keys, the way IndexedDB
    /// advances its key generator past caller-supplied keys.
    fn advance_key_generator(&mut self, key: &RecordValue) {
        if let Some(n) = key.as_u64() {
            if n >= self.next_key {
                // Saturates so an explicit u64::MAX key cannot wrap the counter.
                self.next_key = n.saturating_add(1);
            }
        }
    }
}

fn unknown_store(store_name: &str) -> BackendError {
    BackendError::UnknownStore(store_name.to_string())
}

/// In-memory database holding named object stores.
///
/// Clones share the same underlying stores, so handles are cheap to pass
/// around and data written through one handle is visible through the others.
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    database_name: String,
    opened: Arc<AtomicBool>,
    stores: Arc<RwLock<HashMap<String, StoreData>>>,
}

impl InMemoryBackend {
    /// Creates a database with one object store per schema.
    pub fn new(database_name: &str, schemas: &[StoreSchema]) -> Self {
        let stores = schemas
            .iter()
            .map(|schema| (schema.name.clone(), StoreData::new(schema)))
            .collect();
        Self {
            database_name: database_name.to_string(),
            opened: Arc::new(AtomicBool::new(false)),
            stores: Arc::new(RwLock::new(stores)),
        }
    }

    /// Returns the number of records in the named store, 0 for unknown stores.
    pub async fn len(&self, store_name: &str) -> usize {
        let stores = self.stores.read().await;
        stores
            .get(store_name)
            .map_or(0, |store| store.records.len())
    }

    /// Returns true if the named store holds no records.
    pub async fn is_empty(&self, store_name: &str) -> bool {
        self.len(store_name).await == 0
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.opened.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Database(format!(
                "database {} is not open",
                self.database_name
            )))
        }
    }
}

#[async_trait]
impl StoreBackend for InMemoryBackend {
    async fn open(&self) -> Result<(), BackendError> {
        let was_open = self.opened.swap(true, Ordering::SeqCst);
        if !was_open {
            let stores = self.stores.read().await;
            info!(
                database = %self.database_name,
                stores = stores.len(),
                "Opened in-memory database"
            );
        }
        Ok(())
    }

    async fn clear(&self, store_name: &str) -> Result<(), BackendError> {
        self.ensure_open()?;
        let mut stores = self.stores.write().await;
        let store = stores
            .get_mut(store_name)
            .ok_or_else(|| unknown_store(store_name))?;
        store.records.clear();
        info!(store = %store_name, "Cleared object store");
        Ok(())
    }

    async fn delete_by_key(&self, store_name: &str, key: &RecordValue) -> Result<(), BackendError> {
        self.ensure_open()?;
        let mut stores = self.stores.write().await;
        let store = stores
            .get_mut(store_name)
            .ok_or_else(|| unknown_store(store_name))?;
        match store.position_of(key) {
            Some(position) => {
                store.records.remove(position);
                Ok(())
            }
            None => Err(BackendError::NotFound(format!(
                "no record with key {} in store {}",
                key, store_name
            ))),
        }
    }

    async fn get_all(&self, store_name: &str) -> Result<Option<Vec<RecordValue>>, BackendError> {
        self.ensure_open()?;
        let stores = self.stores.read().await;
        let store = stores
            .get(store_name)
            .ok_or_else(|| unknown_store(store_name))?;
        if store.records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(store.records.clone()))
        }
    }

    async fn find_by_field(
        &self,
        store_name: &str,
        field: &str,
        value: &RecordValue,
    ) -> Result<Vec<RecordValue>, BackendError> {
        self.ensure_open()?;
        let stores = self.stores.read().await;
        let store = stores
            .get(store_name)
            .ok_or_else(|| unknown_store(store_name))?;
        let matches = store
            .records
            .iter()
            .filter(|record| record.get(field) == Some(value))
            .cloned()
            .collect();
        Ok(matches)
    }

    async fn insert(&self, record: StoreRecord) -> Result<Option<RecordValue>, BackendError> {
        self.ensure_open()?;
        let mut stores = self.stores.write().await;
        let store = stores
            .get_mut(&record.store_name)
            .ok_or_else(|| unknown_store(&record.store_name))?;

        if !record.record.is_object() {
            return Err(BackendError::InvalidRecord(format!(
                "store {} only holds JSON objects",
                record.store_name
            )));
        }
        let mut stored = record.record;

        let (key, generated) = match store.key_of(&stored) {
            Some(key) => (key, false),
            None if store.auto_increment => (RecordValue::from(store.next_key), true),
            None => {
                return Err(BackendError::InvalidRecord(format!(
                    "record for store {} is missing key field {}",
                    record.store_name, store.key_field
                )))
            }
        };

        if store.position_of(&key).is_some() {
            return Err(BackendError::DuplicateKey(format!(
                "key {} already exists in store {}",
                key, record.store_name
            )));
        }

        if generated {
            store.next_key = store.next_key.saturating_add(1);
            stored[store.key_field.as_str()] = key.clone();
        } else {
            store.advance_key_generator(&key);
        }

        store.records.push(stored.clone());
        Ok(Some(stored))
    }

    async fn update(&self, record: UpdateRecord) -> Result<(), BackendError> {
        self.ensure_open()?;
        let mut stores = self.stores.write().await;
        let store = stores
            .get_mut(&record.store_name)
            .ok_or_else(|| unknown_store(&record.store_name))?;

        if !record.record.is_object() {
            return Err(BackendError::InvalidRecord(format!(
                "store {} only holds JSON objects",
                record.store_name
            )));
        }

        // The envelope key wins over whatever the record carries in its key
        // field, matching a keyed put.
        let mut stored = record.record;
        stored[store.key_field.as_str()] = record.key.clone();
        store.advance_key_generator(&record.key);

        match store.position_of(&record.key) {
            Some(position) => store.records[position] = stored,
            None => store.records.push(stored),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn customers_backend() -> InMemoryBackend {
        InMemoryBackend::new("crm", &[StoreSchema::new("customers", "id")])
    }

    fn tasks_backend() -> InMemoryBackend {
        InMemoryBackend::new("todo", &[StoreSchema::with_auto_key("tasks", "id")])
    }

    fn customer_record(id: i64, name: &str) -> StoreRecord {
        StoreRecord::new("customers".to_string(), json!({ "id": id, "name": name }))
    }

    #[tokio::test]
    async fn test_operations_require_open() {
        let backend = customers_backend();

        let err = backend.get_all("customers").await.unwrap_err();
        assert!(matches!(err, BackendError::Database(_)));

        let err = backend.insert(customer_record(1, "Ada")).await.unwrap_err();
        assert!(matches!(err, BackendError::Database(_)));
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let backend = customers_backend();
        backend.open().await.unwrap();
        backend.open().await.unwrap();
        assert!(backend.get_all("customers").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_and_get_all_keeps_order() {
        let backend = customers_backend();
        backend.open().await.unwrap();

        backend.insert(customer_record(1, "Ada")).await.unwrap();
        backend.insert(customer_record(2, "Grace")).await.unwrap();

        let records = backend.get_all("customers").await.unwrap().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], "Ada");
        assert_eq!(records[1]["name"], "Grace");
    }

    #[tokio::test]
    async fn test_get_all_empty_store_is_none() {
        let backend = customers_backend();
        backend.open().await.unwrap();
        assert!(backend.get_all("customers").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_store_is_an_error() {
        let backend = customers_backend();
        backend.open().await.unwrap();
        let err = backend.get_all("orders").await.unwrap_err();
        assert!(matches!(err, BackendError::UnknownStore(_)));
    }

    #[tokio::test]
    async fn test_generated_keys_start_at_one() {
        let backend = tasks_backend();
        backend.open().await.unwrap();

        for title in ["first", "second", "third"] {
            let stored = backend
                .insert(StoreRecord::new(
                    "tasks".to_string(),
                    json!({ "title": title }),
                ))
                .await
                .unwrap()
                .unwrap();
            assert!(stored["id"].is_u64());
        }

        let records = backend.get_all("tasks").await.unwrap().unwrap();
        let ids: Vec<u64> = records.iter().map(|r| r["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_null_key_counts_as_absent() {
        let backend = tasks_backend();
        backend.open().await.unwrap();

        let stored = backend
            .insert(StoreRecord::new(
                "tasks".to_string(),
                json!({ "id": null, "title": "first" }),
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["id"], json!(1));
    }

    #[tokio::test]
    async fn test_explicit_key_advances_generator() {
        let backend = tasks_backend();
        backend.open().await.unwrap();

        backend
            .insert(StoreRecord::new(
                "tasks".to_string(),
                json!({ "id": 10, "title": "explicit" }),
            ))
            .await
            .unwrap();
        let stored = backend
            .insert(StoreRecord::new(
                "tasks".to_string(),
                json!({ "title": "generated" }),
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["id"], json!(11));
    }

    #[tokio::test]
    async fn test_key_generator_saturates_at_max() {
        let backend = tasks_backend();
        backend.open().await.unwrap();

        let stored = backend
            .insert(StoreRecord::new(
                "tasks".to_string(),
                json!({ "id": u64::MAX, "title": "ceiling" }),
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["id"], json!(u64::MAX));

        // The generator is pinned at the ceiling, so the next generated key
        // collides with the record already holding it.
        let err = backend
            .insert(StoreRecord::new(
                "tasks".to_string(),
                json!({ "title": "one past the ceiling" }),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::DuplicateKey(_)));

        backend
            .delete_by_key("tasks", &json!(u64::MAX))
            .await
            .unwrap();
        let stored = backend
            .insert(StoreRecord::new(
                "tasks".to_string(),
                json!({ "title": "generated at the ceiling" }),
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["id"], json!(u64::MAX));
    }

    #[tokio::test]
    async fn test_insert_without_key_rejected_when_not_generated() {
        let backend = customers_backend();
        backend.open().await.unwrap();

        let err = backend
            .insert(StoreRecord::new(
                "customers".to_string(),
                json!({ "name": "Ada" }),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected_and_store_unchanged() {
        let backend = customers_backend();
        backend.open().await.unwrap();

        backend.insert(customer_record(1, "Ada")).await.unwrap();
        let err = backend.insert(customer_record(1, "Imposter")).await.unwrap_err();
        assert!(matches!(err, BackendError::DuplicateKey(_)));

        let records = backend.get_all("customers").await.unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "Ada");
    }

    #[tokio::test]
    async fn test_non_object_record_rejected() {
        let backend = customers_backend();
        backend.open().await.unwrap();

        let err = backend
            .insert(StoreRecord::new("customers".to_string(), json!(42)))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn test_delete_by_key() {
        let backend = customers_backend();
        backend.open().await.unwrap();

        backend.insert(customer_record(1, "Ada")).await.unwrap();
        backend.delete_by_key("customers", &json!(1)).await.unwrap();
        assert!(backend.get_all("customers").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_not_found() {
        let backend = customers_backend();
        backend.open().await.unwrap();

        let err = backend
            .delete_by_key("customers", &json!(99))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_by_field() {
        let backend = customers_backend();
        backend.open().await.unwrap();

        backend.insert(customer_record(1, "Ada")).await.unwrap();
        backend.insert(customer_record(2, "Grace")).await.unwrap();
        backend.insert(customer_record(3, "Ada")).await.unwrap();

        let matches = backend
            .find_by_field("customers", "name", &json!("Ada"))
            .await
            .unwrap();
        assert_eq!(matches.len(), 2);

        let matches = backend
            .find_by_field("customers", "id", &json!(2))
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0]["name"], "Grace");
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let backend = customers_backend();
        backend.open().await.unwrap();

        backend.insert(customer_record(1, "Ada")).await.unwrap();
        backend.insert(customer_record(2, "Grace")).await.unwrap();

        backend
            .update(UpdateRecord::new(
                "customers".to_string(),
                json!(1),
                json!({ "id": 1, "name": "Ada Lovelace" }),
            ))
            .await
            .unwrap();

        let records = backend.get_all("customers").await.unwrap().unwrap();
        assert_eq!(records[0]["name"], "Ada Lovelace");
        assert_eq!(records[1]["name"], "Grace");
    }

    #[tokio::test]
    async fn test_update_unseen_key_appends() {
        let backend = customers_backend();
        backend.open().await.unwrap();

        backend
            .update(UpdateRecord::new(
                "customers".to_string(),
                json!(7),
                json!({ "name": "Edsger" }),
            ))
            .await
            .unwrap();

        let records = backend.get_all("customers").await.unwrap().unwrap();
        assert_eq!(records.len(), 1);
        // The envelope key is written into the record's key field.
        assert_eq!(records[0]["id"], json!(7));
    }

    #[tokio::test]
    async fn test_clear_keeps_key_generator() {
        let backend = tasks_backend();
        backend.open().await.unwrap();

        backend
            .insert(StoreRecord::new(
                "tasks".to_string(),
                json!({ "title": "first" }),
            ))
            .await
            .unwrap();
        backend.clear("tasks").await.unwrap();

        let stored = backend
            .insert(StoreRecord::new(
                "tasks".to_string(),
                json!({ "title": "second" }),
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["id"], json!(2));
    }

    #[tokio::test]
    async fn test_len_and_is_empty() {
        let backend = customers_backend();
        backend.open().await.unwrap();

        assert!(backend.is_empty("customers").await);
        backend.insert(customer_record(1, "Ada")).await.unwrap();
        assert_eq!(backend.len("customers").await, 1);
        assert!(!backend.is_empty("customers").await);
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let backend = customers_backend();
        backend.open().await.unwrap();

        let handle = backend.clone();
        backend.insert(customer_record(1, "Ada")).await.unwrap();
        assert_eq!(handle.len("customers").await, 1);
    }
}
