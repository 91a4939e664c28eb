//! Registry port for cloud-provisioned servers.

use super::{CloudAccount, CloudSessionError};
use crate::server::domain::{HostId, ManagedServer, RegionId, RegionMap};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for managed server registry operations.
pub type ManagedServerRegistryResult<T> = Result<T, ManagedServerRegistryError>;

/// Set of servers provisioned through the cloud provider, including ones
/// that are still installing.
#[async_trait]
pub trait ManagedServerRegistry: Send + Sync {
    /// Returns the account of the stored credential.
    async fn account(&self) -> ManagedServerRegistryResult<CloudAccount>;

    /// Starts provisioning a server in `region`.
    ///
    /// Returns as soon as the host exists; the server is still installing.
    async fn create_server(&self, region: &RegionId) -> ManagedServerRegistryResult<ManagedServer>;

    /// Returns installing and ready servers, oldest first.
    async fn list_servers(&self) -> ManagedServerRegistryResult<Vec<ManagedServer>>;

    /// Re-reads one server from the provider.
    ///
    /// # Errors
    ///
    /// Returns [`ManagedServerRegistryError::NotFound`] when the host is gone.
    async fn refresh_server(&self, host_id: HostId) -> ManagedServerRegistryResult<ManagedServer>;

    /// Deletes the host behind a server.
    async fn delete_server(&self, host_id: HostId) -> ManagedServerRegistryResult<()>;

    /// Returns available regions grouped by location.
    async fn get_region_map(&self) -> ManagedServerRegistryResult<RegionMap>;
}

/// Errors returned by managed server registry implementations.
#[derive(Debug, Clone, Error)]
pub enum ManagedServerRegistryError {
    /// The host does not exist.
    #[error("managed server host {0} not found")]
    NotFound(HostId),

    /// The region does not offer the configured host size.
    #[error("region {0} is not available for new servers")]
    UnsupportedRegion(RegionId),

    /// The provider returned a host that cannot be read.
    #[error("managed server host {host_id} is invalid: {reason}")]
    InvalidHost {
        /// Host identifier.
        host_id: HostId,
        /// What was wrong with it.
        reason: String,
    },

    /// The install script could not be rendered.
    #[error("install script rendering failed: {0}")]
    InstallScript(String),

    /// The provider call failed.
    #[error(transparent)]
    Cloud(#[from] CloudSessionError),
}
