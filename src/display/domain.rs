//! Display server snapshots.

use crate::server::domain::{ManagementApiUrl, Server, ServerKind};
use serde::{Deserialize, Serialize};

/// Whether a displayed server can be used yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayInstallState {
    /// A managed server that has not finished installing.
    Installing,
    /// A usable server.
    Ready,
}

/// Serialisable snapshot of a server, keyed by its management URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayServer {
    id: ManagementApiUrl,
    name: String,
    is_managed: bool,
    install_state: DisplayInstallState,
}

impl DisplayServer {
    /// Returns the management URL the snapshot was taken from.
    #[must_use]
    pub const fn id(&self) -> &ManagementApiUrl {
        &self.id
    }

    /// Returns the server name at snapshot time.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the server is cloud-managed.
    #[must_use]
    pub const fn is_managed(&self) -> bool {
        self.is_managed
    }

    /// Returns the install state at snapshot time.
    #[must_use]
    pub const fn install_state(&self) -> DisplayInstallState {
        self.install_state
    }

    /// Returns whether the server was still installing.
    #[must_use]
    pub fn is_installing(&self) -> bool {
        self.install_state == DisplayInstallState::Installing
    }
}

/// Projects a live server into a display snapshot.
///
/// The projection is pure: an unchanged server always yields an equal
/// snapshot.
#[must_use]
pub fn make_display_server(server: &Server) -> DisplayServer {
    let install_state = if server.is_install_completed() {
        DisplayInstallState::Ready
    } else {
        DisplayInstallState::Installing
    };
    DisplayServer {
        id: server.management_api_url().clone(),
        name: server.name().as_str().to_owned(),
        is_managed: server.kind() == ServerKind::Managed,
        install_state,
    }
}
