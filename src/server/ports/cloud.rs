//! Cloud provider session port.
//!
//! The REST client implementing this port lives outside the crate. Every
//! call may fail with a transport error, which callers treat as "provider
//! temporarily unreachable".

use crate::server::domain::HostId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for cloud session calls.
pub type CloudSessionResult<T> = Result<T, CloudSessionError>;

/// Account the stored credential belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudAccount {
    /// Account e-mail address.
    pub email: String,
    /// Whether the provider verified the e-mail address.
    pub email_verified: bool,
    /// Maximum number of hosts the account may run.
    pub host_limit: u32,
}

/// Size and price of a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropletSize {
    /// Provider size slug.
    pub slug: String,
    /// Monthly price in US dollars.
    pub price_monthly_usd: u32,
    /// Included monthly transfer in terabytes.
    pub transfer_terabytes: u32,
}

/// A cloud host as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Droplet {
    /// Provider host id.
    pub id: HostId,
    /// Host name.
    pub name: String,
    /// Region slug.
    pub region: String,
    /// Size and price.
    pub size: DropletSize,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Tags attached to the host.
    pub tags: Vec<String>,
    /// Key-values published by the install script.
    pub key_values: BTreeMap<String, String>,
}

/// Parameters for creating a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropletSpec {
    /// Provider size slug.
    pub size_slug: String,
    /// Provider image slug.
    pub image_slug: String,
    /// Tags to attach.
    pub tags: Vec<String>,
    /// Script run on first boot.
    pub user_data: String,
}

/// A provider region and what it offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    /// Region slug.
    pub slug: String,
    /// Human-readable region name.
    pub name: String,
    /// Whether new hosts can be created there.
    pub available: bool,
    /// Size slugs offered in the region.
    pub sizes: Vec<String>,
}

/// Cloud provider session contract.
#[async_trait]
pub trait CloudSession: Send + Sync {
    /// Returns the account of the current credential.
    async fn get_account(&self) -> CloudSessionResult<CloudAccount>;

    /// Creates a host and returns it immediately, before it has booted.
    async fn create_droplet(
        &self,
        name: &str,
        region: &str,
        ssh_public_key: &str,
        spec: &DropletSpec,
    ) -> CloudSessionResult<Droplet>;

    /// Returns a host, or `None` when it no longer exists.
    async fn get_droplet(&self, id: HostId) -> CloudSessionResult<Option<Droplet>>;

    /// Returns every host carrying `tag`.
    async fn get_droplets_by_tag(&self, tag: &str) -> CloudSessionResult<Vec<Droplet>>;

    /// Deletes a host.
    async fn delete_droplet(&self, id: HostId) -> CloudSessionResult<()>;

    /// Returns the provider's regions.
    async fn get_region_info(&self) -> CloudSessionResult<Vec<RegionInfo>>;
}

/// Errors returned by cloud session implementations.
#[derive(Debug, Clone, Error)]
pub enum CloudSessionError {
    /// The credential was rejected.
    #[error("cloud provider rejected the credential")]
    Unauthorized,

    /// The provider refused the request.
    #[error("cloud provider refused the request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Provider message.
        message: String,
    },

    /// The provider could not be reached.
    #[error("cloud provider unreachable: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl CloudSessionError {
    /// Wraps a transport failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
