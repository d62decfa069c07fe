//! Repository error types.
//!
//! Backend failures carry through unchanged; serialization failures are split
//! by direction so callers can tell a bad write from a bad read.

use thiserror::Error;

/// Errors that can occur when using repository operations.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Backend error: {0}")]
    Backend(#[from] store_core::BackendError),
    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),
}
