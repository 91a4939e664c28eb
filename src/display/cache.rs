//! Persisted display server cache.

use super::DisplayServer;
use crate::server::domain::ManagementApiUrl;
use crate::storage::ports::{KeyValueStore, KeyValueStoreResult};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Storage key holding the JSON list of display servers.
pub const DISPLAY_SERVERS_KEY: &str = "display-servers";
/// Storage key holding the id of the last displayed server.
pub const LAST_DISPLAYED_SERVER_KEY: &str = "last-displayed-server";

/// The persisted display list could not be decoded.
///
/// Never leaves this module: a corrupt cache reads as empty.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("display server cache is corrupt: {0}")]
pub struct CorruptCacheError(pub String);

/// Repository for display snapshots and the last-displayed pointer.
#[derive(Debug)]
pub struct DisplayServerCache<K>
where
    K: KeyValueStore,
{
    store: Arc<K>,
}

impl<K> Clone for DisplayServerCache<K>
where
    K: KeyValueStore,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<K> DisplayServerCache<K>
where
    K: KeyValueStore,
{
    /// Creates a cache over `store`.
    #[must_use]
    pub const fn new(store: Arc<K>) -> Self {
        Self { store }
    }

    /// Returns the cached display list.
    ///
    /// A missing, unreadable, or corrupt value yields an empty list.
    pub async fn list_servers(&self) -> Vec<DisplayServer> {
        let raw = match self.store.get(DISPLAY_SERVERS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "display server cache unreadable");
                return Vec::new();
            }
        };
        decode_servers(&raw).unwrap_or_else(|err| {
            warn!(error = %err, "ignoring display server cache");
            Vec::new()
        })
    }

    /// Replaces the cached display list with a single write.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the key-value store.
    pub async fn store_servers(&self, servers: &[DisplayServer]) -> KeyValueStoreResult<()> {
        let serialized = serde_json::to_string(servers)
            .map_err(crate::storage::ports::KeyValueStoreError::unavailable)?;
        self.store.set(DISPLAY_SERVERS_KEY, &serialized).await
    }

    /// Persists the id of the server the user is looking at.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the key-value store.
    pub async fn store_last_displayed_server_id(
        &self,
        id: &ManagementApiUrl,
    ) -> KeyValueStoreResult<()> {
        self.store.set(LAST_DISPLAYED_SERVER_KEY, id.as_str()).await
    }

    /// Returns the id of the last displayed server, if one was stored.
    pub async fn last_displayed_server_id(&self) -> Option<ManagementApiUrl> {
        match self.store.get(LAST_DISPLAYED_SERVER_KEY).await {
            Ok(value) => value.and_then(|raw| ManagementApiUrl::new(raw).ok()),
            Err(err) => {
                warn!(error = %err, "last displayed server unreadable");
                None
            }
        }
    }

    /// Forgets the last displayed server.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the key-value store.
    pub async fn clear_last_displayed_server_id(&self) -> KeyValueStoreResult<()> {
        self.store.remove(LAST_DISPLAYED_SERVER_KEY).await
    }
}

fn decode_servers(raw: &str) -> Result<Vec<DisplayServer>, CorruptCacheError> {
    serde_json::from_str(raw).map_err(|err| CorruptCacheError(err.to_string()))
}
