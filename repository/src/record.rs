//! Entity ↔ record conversions.

use serde::de::DeserializeOwned;
use serde::Serialize;
use store_core::RecordValue;

use crate::error::RepositoryError;

/// Serializes an entity into a schemaless record.
pub(crate) fn to_record<E: Serialize>(entity: &E) -> Result<RecordValue, RepositoryError> {
    serde_json::to_value(entity).map_err(RepositoryError::Encode)
}

/// Deserializes a record back into an entity.
pub(crate) fn from_record<E: DeserializeOwned>(record: RecordValue) -> Result<E, RepositoryError> {
    serde_json::from_value(record).map_err(RepositoryError::Decode)
}

/// Serializes a key for backend addressing.
pub(crate) fn key_value<K: Serialize>(key: &K) -> Result<RecordValue, RepositoryError> {
    serde_json::to_value(key).map_err(RepositoryError::Encode)
}

/// Short name of `E`: the last path segment, generic arguments stripped.
/// `crm::models::Customer` and `Paged<Customer>` yield `Customer` and `Paged`.
pub(crate) fn short_type_name<E>() -> String {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
