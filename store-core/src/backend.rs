//! Store backend contracts.
//!
//! A [`StoreBackend`] is one opened database holding named object stores; a
//! [`StoreFactory`] hands out backends by database name. Repositories talk to
//! these traits only, so the in-memory reference backend and test doubles are
//! interchangeable.

use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope::{RecordValue, StoreRecord, UpdateRecord};
use crate::error::BackendError;

/// One database holding named object stores.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Opens the database. Must complete before any store operation.
    async fn open(&self) -> Result<(), BackendError>;

    /// Removes every record from the named store.
    async fn clear(&self, store_name: &str) -> Result<(), BackendError>;

    /// Deletes the record stored under `key`. Deleting a missing key is an error.
    async fn delete_by_key(&self, store_name: &str, key: &RecordValue) -> Result<(), BackendError>;

    /// Returns every record in the named store, `None` when the store holds no data.
    async fn get_all(&self, store_name: &str) -> Result<Option<Vec<RecordValue>>, BackendError>;

    /// Returns the records whose `field` equals `value`, in store order.
    async fn find_by_field(
        &self,
        store_name: &str,
        field: &str,
        value: &RecordValue,
    ) -> Result<Vec<RecordValue>, BackendError>;

    /// Inserts a record. Returns the stored record, with any generated key
    /// filled in, when the backend can report it; `None` otherwise.
    async fn insert(&self, record: StoreRecord) -> Result<Option<RecordValue>, BackendError>;

    /// Puts a record under the key in the envelope, replacing or creating it.
    async fn update(&self, record: UpdateRecord) -> Result<(), BackendError>;
}

/// Opens [`StoreBackend`] handles by database name.
#[async_trait]
pub trait StoreFactory: Send + Sync {
    async fn open_store(&self, database_name: &str) -> Result<Arc<dyn StoreBackend>, BackendError>;
}
