//! Registry port for manually added servers.

use crate::server::domain::{ManagementApiUrl, ManualServer, ManualServerConfig, ServerId};
use crate::storage::ports::KeyValueStoreError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for manual server registry operations.
pub type ManualServerRegistryResult<T> = Result<T, ManualServerRegistryError>;

/// Durable set of user-added servers, in insertion order.
///
/// Adding the same URL twice creates two entries.
#[async_trait]
pub trait ManualServerRegistry: Send + Sync {
    /// Registers a server from validated configuration.
    async fn add_server(&self, config: ManualServerConfig)
    -> ManualServerRegistryResult<ManualServer>;

    /// Returns the first server whose URL equals `config`'s URL.
    async fn find_server(
        &self,
        config: &ManualServerConfig,
    ) -> ManualServerRegistryResult<Option<ManualServer>>;

    /// Returns all servers in insertion order.
    async fn list_servers(&self) -> ManualServerRegistryResult<Vec<ManualServer>>;

    /// Persists changes to an existing server.
    ///
    /// # Errors
    ///
    /// Returns [`ManualServerRegistryError::NotFound`] when no server has the
    /// same identifier.
    async fn update_server(&self, server: &ManualServer) -> ManualServerRegistryResult<()>;

    /// Removes every server registered under `api_url` and returns how many
    /// were removed.
    async fn forget_server(&self, api_url: &ManagementApiUrl) -> ManualServerRegistryResult<usize>;
}

/// Errors returned by manual server registry implementations.
#[derive(Debug, Clone, Error)]
pub enum ManualServerRegistryError {
    /// The server was not found.
    #[error("manual server not found: {0}")]
    NotFound(ServerId),

    /// Persisted data could not be decoded.
    #[error("invalid persisted manual server data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] KeyValueStoreError),
}

impl ManualServerRegistryError {
    /// Wraps a decoding failure.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }
}
