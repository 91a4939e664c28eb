//! Cloud-provisioned relay servers.

use super::{HostId, ManagementApiUrl, RegionId, ServerCore, ServerId, ServerName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Installation progress of a managed server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InstallState {
    /// The host is booting or running its install script.
    Installing {
        /// Last progress reported by the install script, 0 to 100.
        progress_percent: u8,
    },
    /// The install finished and the management API is reachable.
    Completed,
    /// The install script reported a failure.
    Failed {
        /// Failure reason reported by the host.
        reason: String,
    },
}

impl InstallState {
    /// Returns whether the install finished successfully.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns whether the install is still running.
    #[must_use]
    pub const fn is_installing(&self) -> bool {
        matches!(self, Self::Installing { .. })
    }

    /// Returns reported progress while installing.
    #[must_use]
    pub const fn progress_percent(&self) -> Option<u8> {
        match self {
            Self::Installing { progress_percent } => Some(*progress_percent),
            Self::Completed | Self::Failed { .. } => None,
        }
    }
}

/// Cloud host facts for a managed server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedHost {
    host_id: HostId,
    region: RegionId,
    monthly_cost_usd: u32,
    monthly_transfer_limit_terabytes: u32,
}

impl ManagedHost {
    /// Creates host facts.
    #[must_use]
    pub const fn new(
        host_id: HostId,
        region: RegionId,
        monthly_cost_usd: u32,
        monthly_transfer_limit_terabytes: u32,
    ) -> Self {
        Self {
            host_id,
            region,
            monthly_cost_usd,
            monthly_transfer_limit_terabytes,
        }
    }

    /// Returns the provider host id.
    #[must_use]
    pub const fn host_id(&self) -> HostId {
        self.host_id
    }

    /// Returns the region the host runs in.
    #[must_use]
    pub const fn region(&self) -> &RegionId {
        &self.region
    }

    /// Returns the monthly price in US dollars.
    #[must_use]
    pub const fn monthly_cost_usd(&self) -> u32 {
        self.monthly_cost_usd
    }

    /// Returns the included monthly transfer in terabytes.
    #[must_use]
    pub const fn monthly_transfer_limit_terabytes(&self) -> u32 {
        self.monthly_transfer_limit_terabytes
    }
}

/// Parameter object for building a managed server from provider data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedServerData {
    /// Host facts.
    pub host: ManagedHost,
    /// Server name.
    pub name: ServerName,
    /// Management URL published by the install script, once available.
    pub management_api_url: Option<ManagementApiUrl>,
    /// Install progress.
    pub install_state: InstallState,
    /// Host creation time.
    pub created_at: DateTime<Utc>,
}

/// A relay server provisioned through the cloud provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedServer {
    core: ServerCore,
    host: ManagedHost,
    install_state: InstallState,
    created_at: DateTime<Utc>,
}

impl ManagedServer {
    /// Builds a managed server. Until a management URL is published the
    /// server is keyed by [`ManagementApiUrl::pending_host`].
    #[must_use]
    pub fn from_data(data: ManagedServerData) -> Self {
        let host_id = data.host.host_id();
        let url = data
            .management_api_url
            .unwrap_or_else(|| ManagementApiUrl::pending_host(host_id));
        Self {
            core: ServerCore::new(ServerId::for_host(host_id), data.name, url),
            host: data.host,
            install_state: data.install_state,
            created_at: data.created_at,
        }
    }

    /// Returns the shared capability set.
    #[must_use]
    pub const fn core(&self) -> &ServerCore {
        &self.core
    }

    /// Returns the shared capability set for mutation.
    pub const fn core_mut(&mut self) -> &mut ServerCore {
        &mut self.core
    }

    /// Returns host facts.
    #[must_use]
    pub const fn host(&self) -> &ManagedHost {
        &self.host
    }

    /// Returns the provider host id.
    #[must_use]
    pub const fn host_id(&self) -> HostId {
        self.host.host_id()
    }

    /// Returns install progress.
    #[must_use]
    pub const fn install_state(&self) -> &InstallState {
        &self.install_state
    }

    /// Returns whether the install finished successfully.
    #[must_use]
    pub const fn is_install_completed(&self) -> bool {
        self.install_state.is_completed()
    }

    /// Returns when the host was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
