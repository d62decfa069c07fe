//! Backend error types.
//!
//! Used by store backends and by repositories built on top of them.

use thiserror::Error;

/// Errors that can occur when using a store backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Unknown store: {0}")]
    UnknownStore(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}
