//! In-memory key-value store.

use crate::storage::ports::{KeyValueStore, KeyValueStoreError, KeyValueStoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory key-value store.
///
/// Clones share the same underlying map, which lets tests seed values and
/// inspect writes made by the code under test.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let values = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            values: Arc::new(RwLock::new(values)),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> KeyValueStoreResult<Option<String>> {
        let values = self.values.read().map_err(|err| {
            KeyValueStoreError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> KeyValueStoreResult<()> {
        let mut values = self.values.write().map_err(|err| {
            KeyValueStoreError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> KeyValueStoreResult<()> {
        let mut values = self.values.write().map_err(|err| {
            KeyValueStoreError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        values.remove(key);
        Ok(())
    }
}
