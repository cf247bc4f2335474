pub mod db;
mod memory;
pub mod models;
mod tables;

pub use db::{Database, DatabaseError};
pub use memory::MemoryStore;
pub use tables::*;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Synchronous string key-value persistence shared by both stores.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DatabaseError>;
    fn set(&self, key: &str, value: &str) -> Result<(), DatabaseError>;
    fn remove(&self, key: &str) -> Result<(), DatabaseError>;
}

/// Read and decode a JSON value. Missing, unreadable and malformed entries all
/// come back as `None`; the latter two are logged.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Unable to read stored value");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Unable to parse stored value");
            None
        }
    }
}

/// Encode and store a JSON value. Failures are logged, never returned: callers
/// keep their in-memory state either way.
pub fn write_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(DatabaseError::from)
        .and_then(|raw| store.set(key, &raw));

    if let Err(e) = result {
        tracing::warn!(key, error = %e, "Unable to persist value");
    }
}

/// Store a raw string, or remove the key when `value` is `None`.
pub fn write_raw(store: &dyn KeyValueStore, key: &str, value: Option<&str>) {
    let result = match value {
        Some(v) => store.set(key, v),
        None => store.remove(key),
    };

    if let Err(e) = result {
        tracing::warn!(key, error = %e, "Unable to persist value");
    }
}
