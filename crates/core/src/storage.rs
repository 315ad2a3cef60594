//! Key/value persistence contract.
//!
//! The navigation core only relies on a tiny get/set/remove surface over JSON
//! values; how the values reach disk (or browser storage, or nowhere) is up to
//! the implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;

/// Well-known keys used to persist the session.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    pub const USER_INFO: &str = "userInfo";
    pub const ROLE: &str = "role";
    pub const ACCESS_TOKEN_EXPIRES_AT: &str = "accessTokenExpiresAt";

    /// Every session key, in the order they are cleared on logout.
    pub const SESSION: [&str; 5] = [
        ACCESS_TOKEN,
        REFRESH_TOKEN,
        USER_INFO,
        ROLE,
        ACCESS_TOKEN_EXPIRES_AT,
    ];
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage lock poisoned")]
    Poisoned,
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A synchronous key/value store holding JSON values.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing entries (e.g. a session persisted by an
    /// earlier process).
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            entries: Mutex::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.get(keys::ACCESS_TOKEN).unwrap().is_none());

        store.set(keys::ACCESS_TOKEN, json!("abc")).unwrap();
        assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap(), Some(json!("abc")));

        store.remove(keys::ACCESS_TOKEN).unwrap();
        assert!(store.get(keys::ACCESS_TOKEN).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn removing_missing_key_is_noop() {
        let store = MemoryStore::with_entries([(keys::ROLE, json!(["admin"]))]);
        store.remove(keys::ACCESS_TOKEN).unwrap();
        assert_eq!(store.len(), 1);
    }
}
