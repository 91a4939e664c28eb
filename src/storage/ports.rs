//! Key-value storage port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for key-value storage operations.
pub type KeyValueStoreResult<T> = Result<T, KeyValueStoreError>;

/// String key-value storage contract.
///
/// Writes replace the whole value stored under a key, so a reader never
/// observes a partially written value.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> KeyValueStoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> KeyValueStoreResult<()>;

    /// Removes the value stored under `key`. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> KeyValueStoreResult<()>;
}

/// Errors returned by key-value storage adapters.
#[derive(Debug, Clone, Error)]
pub enum KeyValueStoreError {
    /// The key is not usable by this adapter.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// The storage backend could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl KeyValueStoreError {
    /// Wraps a backend failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
