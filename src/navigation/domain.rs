//! Navigation pages and the view model they are rendered from.

use crate::display::DisplayServer;
use crate::server::domain::{HostId, ManagementApiUrl};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level page shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppPage {
    /// No server is known; offer to add one.
    #[default]
    Intro,
    /// A managed server is installing.
    ServerProgress,
    /// A usable server is shown.
    ServerView,
}

impl AppPage {
    /// Returns the page for a selected server.
    #[must_use]
    pub fn for_server(server: &DisplayServer) -> Self {
        if server.is_installing() {
            Self::ServerProgress
        } else {
            Self::ServerView
        }
    }

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::ServerProgress => "server_progress",
            Self::ServerView => "server_view",
        }
    }
}

impl fmt::Display for AppPage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Retryable provisioning failure shown on the progress page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    /// Display id of the affected server.
    pub server_id: ManagementApiUrl,
    /// Host of the affected server.
    pub host_id: HostId,
    /// Message for the user.
    pub message: String,
}

/// Everything the controller writes to the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewModel {
    /// Current page.
    pub current_page: AppPage,
    /// Servers in display order.
    pub server_list: Vec<DisplayServer>,
    /// Selected server.
    pub selected_server: Option<DisplayServer>,
    /// Provisioning failure banner.
    pub error_banner: Option<ErrorBanner>,
}
