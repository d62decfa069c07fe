//! In-memory store backend: a working reference implementation of the
//! `store-core` contracts, for tests, demos and development.
//!
//! ## Modules
//!
//! - [`schema`] – StoreSchema store declarations
//! - [`backend`] – InMemoryBackend object-store database
//! - [`factory`] – InMemoryFactory database registry

mod backend;
mod factory;
mod schema;

pub use backend::InMemoryBackend;
pub use factory::InMemoryFactory;
pub use schema::StoreSchema;
