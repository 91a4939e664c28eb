//! Tagged union over the two server variants.

use super::{ManagedServer, ManagementApiUrl, ManualServer, ServerCore, ServerId, ServerName};
use serde::{Deserialize, Serialize};

/// Which registry owns a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerKind {
    /// Registered by the user.
    Manual,
    /// Provisioned through the cloud provider.
    Managed,
}

/// A relay server of either kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Server {
    /// A server registered by the user.
    Manual(ManualServer),
    /// A server provisioned through the cloud provider.
    Managed(ManagedServer),
}

impl Server {
    /// Returns the shared capability set.
    #[must_use]
    pub const fn core(&self) -> &ServerCore {
        match self {
            Self::Manual(server) => server.core(),
            Self::Managed(server) => server.core(),
        }
    }

    /// Returns the shared capability set for mutation.
    pub const fn core_mut(&mut self) -> &mut ServerCore {
        match self {
            Self::Manual(server) => server.core_mut(),
            Self::Managed(server) => server.core_mut(),
        }
    }

    /// Returns the server kind.
    #[must_use]
    pub const fn kind(&self) -> ServerKind {
        match self {
            Self::Manual(_) => ServerKind::Manual,
            Self::Managed(_) => ServerKind::Managed,
        }
    }

    /// Returns the immutable server identifier.
    #[must_use]
    pub const fn id(&self) -> ServerId {
        self.core().id()
    }

    /// Returns the server name.
    #[must_use]
    pub const fn name(&self) -> &ServerName {
        self.core().name()
    }

    /// Returns the management API URL.
    #[must_use]
    pub const fn management_api_url(&self) -> &ManagementApiUrl {
        self.core().management_api_url()
    }

    /// Returns whether the server can be used. Manual servers always can.
    #[must_use]
    pub const fn is_install_completed(&self) -> bool {
        match self {
            Self::Manual(_) => true,
            Self::Managed(server) => server.is_install_completed(),
        }
    }

    /// Returns the managed variant, if this is one.
    #[must_use]
    pub const fn as_managed(&self) -> Option<&ManagedServer> {
        match self {
            Self::Managed(server) => Some(server),
            Self::Manual(_) => None,
        }
    }
}

impl From<ManualServer> for Server {
    fn from(server: ManualServer) -> Self {
        Self::Manual(server)
    }
}

impl From<ManagedServer> for Server {
    fn from(server: ManagedServer) -> Self {
        Self::Managed(server)
    }
}
