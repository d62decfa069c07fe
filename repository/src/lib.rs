//! Repository crate: generic entity repositories over schemaless object stores.
//!
//! ## Modules
//!
//! - [`error`] – Repository error types
//! - [`filter`] – QueryFilter trait for narrowing full scans
//! - [`record`] – entity ↔ record conversion helpers
//! - [`repository`] – Repository trait and StoreRepository

mod error;
mod filter;
mod record;
mod repository;


pub use error::RepositoryError;
pub use filter::QueryFilter;
pub use repository::{Repository, StoreRepository};
