//! Generic repository over an object-store backend.
//!
//! One repository manages one object store inside a named database. The store
//! name is the entity type's short name, so `Customer` entities live in a
//! `Customer` store. The backend connection is opened lazily on the first
//! operation and shared by everything that follows.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use store_core::{StoreBackend, StoreFactory, StoreRecord, UpdateRecord};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::RepositoryError;
use crate::filter::QueryFilter;
use crate::record::{from_record, key_value, short_type_name, to_record};

/// Data-access operations over entities of type `E` keyed by `K`.
///
/// Write operations come in two flavors. `delete_all` propagates every
/// failure; `delete_by_id`, `insert` and `update` treat a failed store
/// operation as an answer (`false` / `None`) rather than an error, so callers
/// can probe without wrapping each call. Failures to reach the backend at all
/// always surface as errors.
#[async_trait]
pub trait Repository<E, K>: Send + Sync {
    /// Deletes the entity's record, keyed through the key selector.
    async fn delete(&self, entity: &E) -> Result<bool, RepositoryError>;

    /// Removes every record from the store.
    async fn delete_all(&self) -> Result<(), RepositoryError>;

    /// Deletes the record under `id`. `false` when there was nothing to delete.
    async fn delete_by_id(&self, id: &K) -> Result<bool, RepositoryError>;

    /// Returns every entity in the store, in store order.
    async fn get_all(&self) -> Result<Vec<E>, RepositoryError>;

    /// Scans the store and hands the result to `filter`.
    async fn get(&self, filter: &dyn QueryFilter<E>) -> Result<Vec<E>, RepositoryError>;

    /// Returns the entity stored under `id`, `None` when there is none.
    async fn get_by_id(&self, id: &K) -> Result<Option<E>, RepositoryError>;

    /// Inserts an entity and returns it as stored, with any generated key
    /// filled in. `None` when the store rejected the record.
    async fn insert(&self, entity: &E) -> Result<Option<E>, RepositoryError>;

    /// Puts an entity under its key, replacing or creating the record.
    /// Returns the entity back, `None` when the store rejected it.
    async fn update(&self, entity: &E) -> Result<Option<E>, RepositoryError>;
}

/// Repository over one object store inside a named database.
pub struct StoreRepository<E, K>
where
    E: 'static,
    K: 'static,
{
    database_name: String,
    store_name: String,
    key_field: String,
    auto_generate_key: bool,
    key_of: Box<dyn Fn(&E) -> K + Send + Sync>,
    factory: Arc<dyn StoreFactory>,
    connection: OnceCell<Arc<dyn StoreBackend>>,
}

impl<E, K> StoreRepository<E, K>
where
    E: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    K: Serialize + Send + Sync + 'static,
{
    /// Creates a repository over the `E` store in `database_name`.
    ///
    /// `key_field` names the record field holding the primary key and
    /// `key_of` extracts that key from an entity. `auto_generate_key` records
    /// whether the store assigns keys itself; key generation is governed by
    /// the store's schema on the backend side.
    pub fn new(
        database_name: &str,
        key_field: &str,
        key_of: impl Fn(&E) -> K + Send + Sync + 'static,
        auto_generate_key: bool,
        factory: Arc<dyn StoreFactory>,
    ) -> Self {
        Self {
            database_name: database_name.to_string(),
            store_name: short_type_name::<E>(),
            key_field: key_field.to_string(),
            auto_generate_key,
            key_of: Box::new(key_of),
            factory,
            connection: OnceCell::new(),
        }
    }

    /// Name of the object store this repository manages.
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn auto_generate_key(&self) -> bool {
        self.auto_generate_key
    }

    /// Opens the backend on first use. Concurrent first calls share a single
    /// open; a failed attempt caches nothing, so the next call retries.
    async fn connection(&self) -> Result<&Arc<dyn StoreBackend>, RepositoryError> {
        self.connection
            .get_or_try_init(|| async {
                let backend = self.factory.open_store(&self.database_name).await?;
                backend.open().await?;
                info!(
                    database = %self.database_name,
                    store = %self.store_name,
                    "Connected to object store"
                );
                Ok(backend)
            })
            .await
    }

    async fn try_delete_by_id(
        &self,
        connection: &Arc<dyn StoreBackend>,
        id: &K,
    ) -> Result<(), RepositoryError> {
        let key = key_value(id)?;
        connection.delete_by_key(&self.store_name, &key).await?;
        Ok(())
    }

    async fn try_insert(
        &self,
        connection: &Arc<dyn StoreBackend>,
        entity: &E,
    ) -> Result<Option<E>, RepositoryError> {
        let record = to_record(entity)?;
        let stored = connection
            .insert(StoreRecord::new(self.store_name.clone(), record))
            .await?;
        match stored {
            Some(record) => Ok(Some(from_record(record)?)),
            // Backends that cannot report the stored record: re-read the
            // store and take the newest record, which in store order is the
            // last one.
            None => {
                let records = connection
                    .get_all(&self.store_name)
                    .await?
                    .unwrap_or_default();
                records.into_iter().last().map(from_record).transpose()
            }
        }
    }

    async fn try_update(
        &self,
        connection: &Arc<dyn StoreBackend>,
        entity: &E,
    ) -> Result<(), RepositoryError> {
        let key = key_value(&(self.key_of)(entity))?;
        let record = to_record(entity)?;
        connection
            .update(UpdateRecord::new(self.store_name.clone(), key, record))
            .await?;
        Ok(())
    }

    async fn read_all(
        &self,
        connection: &Arc<dyn StoreBackend>,
    ) -> Result<Vec<E>, RepositoryError> {
        let records = connection
            .get_all(&self.store_name)
            .await?
            .unwrap_or_default();
        records.into_iter().map(from_record).collect()
    }
}

#[async_trait]
impl<E, K> Repository<E, K> for StoreRepository<E, K>
where
    E: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    K: Serialize + Send + Sync + 'static,
{
    async fn delete(&self, entity: &E) -> Result<bool, RepositoryError> {
        let id = (self.key_of)(entity);
        self.delete_by_id(&id).await
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        let connection = self.connection().await?;
        connection.clear(&self.store_name).await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: &K) -> Result<bool, RepositoryError> {
        let connection = self.connection().await?;
        match self.try_delete_by_id(connection, id).await {
            Ok(()) => Ok(true),
            Err(cause) => {
                warn!(store = %self.store_name, %cause, "Delete by id failed");
                Ok(false)
            }
        }
    }

    async fn get_all(&self) -> Result<Vec<E>, RepositoryError> {
        let connection = self.connection().await?;
        self.read_all(connection).await
    }

    async fn get(&self, filter: &dyn QueryFilter<E>) -> Result<Vec<E>, RepositoryError> {
        let entities = self.get_all().await?;
        Ok(filter.apply(entities))
    }

    async fn get_by_id(&self, id: &K) -> Result<Option<E>, RepositoryError> {
        let connection = self.connection().await?;
        let key = key_value(id)?;
        let matches = connection
            .find_by_field(&self.store_name, &self.key_field, &key)
            .await?;
        matches.into_iter().next().map(from_record).transpose()
    }

    async fn insert(&self, entity: &E) -> Result<Option<E>, RepositoryError> {
        let connection = self.connection().await?;
        match self.try_insert(connection, entity).await {
            Ok(stored) => Ok(stored),
            Err(cause) => {
                warn!(store = %self.store_name, %cause, "Insert failed");
                Ok(None)
            }
        }
    }

    async fn update(&self, entity: &E) -> Result<Option<E>, RepositoryError> {
        let connection = self.connection().await?;
        match self.try_update(connection, entity).await {
            Ok(()) => Ok(Some(entity.clone())),
            Err(cause) => {
                warn!(store = %self.store_name, %cause, "Update failed");
                Ok(None)
            }
        }
    }
}
