//! UI port written by the navigation controller.

use super::domain::{AppPage, ErrorBanner};
use crate::display::DisplayServer;

/// Write-only view of the UI.
///
/// The controller never reads UI state back.
pub trait AppView: Send + Sync {
    /// Switches the visible page.
    fn show_page(&self, page: AppPage);

    /// Replaces the server list.
    fn set_server_list(&self, servers: &[DisplayServer]);

    /// Highlights a server, or none.
    fn select_server(&self, server: Option<&DisplayServer>);

    /// Shows a provisioning failure.
    fn show_error_banner(&self, banner: &ErrorBanner);

    /// Hides the provisioning failure banner.
    fn clear_error_banner(&self);
}
