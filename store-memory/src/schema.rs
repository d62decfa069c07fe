//! Object store declarations.
//!
//! A database is registered with the schemas of the stores it contains, the
//! way an IndexedDB database declares its object stores before it is opened.

/// Declares one object store: its name, the record field holding the primary
/// key, and whether the store generates keys itself.
#[derive(Debug, Clone)]
pub struct StoreSchema {
    pub name: String,
    pub key_field: String,
    pub auto_increment: bool,
}

impl StoreSchema {
    /// A store whose callers supply the key inside every record.
    pub fn new(name: &str, key_field: &str) -> Self {
        Self {
            name: name.to_string(),
            key_field: key_field.to_string(),
            auto_increment: false,
        }
    }

    /// A store that assigns ascending integer keys, starting at 1.
    pub fn with_auto_key(name: &str, key_field: &str) -> Self {
        Self {
            name: name.to_string(),
            key_field: key_field.to_string(),
            auto_increment: true,
        }
    }
}
