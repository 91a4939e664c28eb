//! Token manager persisted in the key-value store.

use crate::server::ports::{TokenManager, TokenManagerError, TokenManagerResult};
use crate::storage::ports::KeyValueStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Storage key holding the cloud credential.
pub const CLOUD_TOKEN_KEY: &str = "cloud-token";

/// Token manager keeping the credential under [`CLOUD_TOKEN_KEY`].
#[derive(Debug, Clone)]
pub struct KeyValueTokenManager<K>
where
    K: KeyValueStore,
{
    store: Arc<K>,
}

impl<K> KeyValueTokenManager<K>
where
    K: KeyValueStore,
{
    /// Creates a token manager over `store`.
    #[must_use]
    pub const fn new(store: Arc<K>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<K> TokenManager for KeyValueTokenManager<K>
where
    K: KeyValueStore,
{
    async fn stored_token(&self) -> TokenManagerResult<Option<String>> {
        let token = self.store.get(CLOUD_TOKEN_KEY).await?;
        Ok(token.filter(|value| !value.trim().is_empty()))
    }

    async fn write_token(&self, token: &str) -> TokenManagerResult<()> {
        let normalized = token.trim();
        if normalized.is_empty() {
            return Err(TokenManagerError::EmptyToken);
        }
        Ok(self.store.set(CLOUD_TOKEN_KEY, normalized).await?)
    }

    async fn remove_token(&self) -> TokenManagerResult<()> {
        Ok(self.store.remove(CLOUD_TOKEN_KEY).await?)
    }
}
