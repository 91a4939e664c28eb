//! Manual server registry persisted in the key-value store.

use crate::server::{
    domain::{ManagementApiUrl, ManualServer, ManualServerConfig},
    ports::{ManualServerRegistry, ManualServerRegistryError, ManualServerRegistryResult},
};
use crate::storage::ports::KeyValueStore;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Storage key holding the JSON list of manual servers.
pub const MANUAL_SERVERS_KEY: &str = "manual-servers";

/// Manual server registry storing its list as one JSON value.
///
/// Mutations are serialised through an async mutex so concurrent
/// read-modify-write cycles do not lose entries.
#[derive(Debug)]
pub struct KeyValueManualServerRegistry<K>
where
    K: KeyValueStore,
{
    store: Arc<K>,
    write_lock: Mutex<()>,
}

impl<K> KeyValueManualServerRegistry<K>
where
    K: KeyValueStore,
{
    /// Creates a registry over `store`.
    #[must_use]
    pub fn new(store: Arc<K>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> ManualServerRegistryResult<Vec<ManualServer>> {
        let Some(serialized) = self.store.get(MANUAL_SERVERS_KEY).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&serialized).map_err(ManualServerRegistryError::invalid_persisted_data)
    }

    async fn save(&self, servers: &[ManualServer]) -> ManualServerRegistryResult<()> {
        let serialized = serde_json::to_string(servers)
            .map_err(ManualServerRegistryError::invalid_persisted_data)?;
        self.store.set(MANUAL_SERVERS_KEY, &serialized).await?;
        Ok(())
    }
}

#[async_trait]
impl<K> ManualServerRegistry for KeyValueManualServerRegistry<K>
where
    K: KeyValueStore,
{
    async fn add_server(
        &self,
        config: ManualServerConfig,
    ) -> ManualServerRegistryResult<ManualServer> {
        let _guard = self.write_lock.lock().await;
        let mut servers = self.load().await?;
        let server = ManualServer::new(config);
        servers.push(server.clone());
        self.save(&servers).await?;
        info!(
            server_id = %server.core().id(),
            api_url = %server.core().management_api_url(),
            "added manual server"
        );
        Ok(server)
    }

    async fn find_server(
        &self,
        config: &ManualServerConfig,
    ) -> ManualServerRegistryResult<Option<ManualServer>> {
        let servers = self.load().await?;
        Ok(servers.into_iter().find(|server| server.matches(config)))
    }

    async fn list_servers(&self) -> ManualServerRegistryResult<Vec<ManualServer>> {
        self.load().await
    }

    async fn update_server(&self, server: &ManualServer) -> ManualServerRegistryResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut servers = self.load().await?;
        let slot = servers
            .iter_mut()
            .find(|stored| stored.core().id() == server.core().id())
            .ok_or(ManualServerRegistryError::NotFound(server.core().id()))?;
        *slot = server.clone();
        self.save(&servers).await
    }

    async fn forget_server(&self, api_url: &ManagementApiUrl) -> ManualServerRegistryResult<usize> {
        let _guard = self.write_lock.lock().await;
        let mut servers = self.load().await?;
        let before = servers.len();
        servers.retain(|server| server.core().management_api_url() != api_url);
        let removed = before.saturating_sub(servers.len());
        if removed > 0 {
            self.save(&servers).await?;
        }
        debug!(%api_url, removed, "forgot manual server");
        Ok(removed)
    }
}
