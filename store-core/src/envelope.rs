//! Write envelopes passed from repositories to store backends.
//!
//! Records are schemaless JSON values; the envelope carries the target store
//! name, and for updates the key the record is stored under.

use serde::{Deserialize, Serialize};

/// A schemaless record as held by an object store.
pub type RecordValue = serde_json::Value;

/// Envelope for inserting a record into a named store.
///
/// Carries no key: the store's own schema decides which record field holds the
/// key and whether the store generates one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    pub store_name: String,
    pub record: RecordValue,
}

impl StoreRecord {
    pub fn new(store_name: String, record: RecordValue) -> Self {
        Self { store_name, record }
    }
}

/// Envelope for putting a record into a named store under an explicit key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub store_name: String,
    pub key: RecordValue,
    pub record: RecordValue,
}

impl UpdateRecord {
    pub fn new(store_name: String, key: RecordValue, record: RecordValue) -> Self {
        Self {
            store_name,
            key,
            record,
        }
    }
}
