//! In-memory database registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use store_core::{BackendError, StoreBackend, StoreFactory};
use tokio::sync::RwLock;

use crate::backend::InMemoryBackend;
use crate::schema::StoreSchema;

/// Registry of named in-memory databases.
///
/// Databases are declared up front with [`register`](Self::register); opening
/// an unregistered name fails. Opening the same name again returns a handle
/// onto the same database, so data is shared across repositories.
#[derive(Clone)]
pub struct InMemoryFactory {
    databases: Arc<RwLock<HashMap<String, Arc<InMemoryBackend>>>>,
}

impl InMemoryFactory {
    pub fn new() -> Self {
        Self {
            databases: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Declares a database and the object stores it contains. Registering a
    /// name again replaces the previous database.
    pub async fn register(&self, database_name: &str, schemas: &[StoreSchema]) {
        info!(
            "Registering in-memory database: {} ({} stores)",
            database_name,
            schemas.len()
        );
        let mut databases = self.databases.write().await;
        databases.insert(
            database_name.to_string(),
            Arc::new(InMemoryBackend::new(database_name, schemas)),
        );
    }
}

impl Default for InMemoryFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreFactory for InMemoryFactory {
    async fn open_store(&self, database_name: &str) -> Result<Arc<dyn StoreBackend>, BackendError> {
        let databases = self.databases.read().await;
        match databases.get(database_name) {
            Some(backend) => Ok(backend.clone() as Arc<dyn StoreBackend>),
            None => Err(BackendError::Database(format!(
                "database {} is not registered",
                database_name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use store_core::StoreRecord;

    #[tokio::test]
    async fn test_open_registered_database() {
        let factory = InMemoryFactory::new();
        factory
            .register("crm", &[StoreSchema::new("customers", "id")])
            .await;

        let backend = factory.open_store("crm").await.unwrap();
        backend.open().await.unwrap();
        assert!(backend.get_all("customers").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_unregistered_database_fails() {
        let factory = InMemoryFactory::new();
        // The Ok handle has no Debug impl, so take the error apart by hand.
        let err = match factory.open_store("missing").await {
            Ok(_) => panic!("open_store should fail for an unregistered database"),
            Err(err) => err,
        };
        assert!(matches!(err, BackendError::Database(_)));
        assert!(err.to_string().contains("not registered"));
    }

    #[tokio::test]
    async fn test_opens_share_one_database() {
        let factory = InMemoryFactory::new();
        factory
            .register("crm", &[StoreSchema::new("customers", "id")])
            .await;

        let first = factory.open_store("crm").await.unwrap();
        first.open().await.unwrap();
        first
            .insert(StoreRecord::new(
                "customers".to_string(),
                json!({ "id": 1, "name": "Ada" }),
            ))
            .await
            .unwrap();

        let second = factory.open_store("crm").await.unwrap();
        let records = second.get_all("customers").await.unwrap().unwrap();
        assert_eq!(records.len(), 1);
    }
}
