//! Store core: object-store contracts shared by backends and repositories.
//!
//! ## Modules
//!
//! - [`error`] – Backend error types
//! - [`envelope`] – StoreRecord / UpdateRecord write envelopes
//! - [`backend`] – StoreBackend and StoreFactory traits

mod backend;
mod envelope;
mod error;

pub use backend::{StoreBackend, StoreFactory};
pub use envelope::{RecordValue, StoreRecord, UpdateRecord};
pub use error::BackendError;
