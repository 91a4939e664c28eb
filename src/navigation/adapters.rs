//! Adapter implementations for the UI port.

use super::{
    domain::{AppPage, ErrorBanner, ViewModel},
    ports::AppView,
};
use crate::display::DisplayServer;
use std::sync::{Arc, RwLock};

/// View that records what the controller wrote into a [`ViewModel`].
///
/// Clones share the same model.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAppView {
    model: Arc<RwLock<ViewModel>>,
}

impl InMemoryAppView {
    /// Creates a view showing the intro page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current model.
    #[must_use]
    pub fn snapshot(&self) -> ViewModel {
        self.model
            .read()
            .map(|model| model.clone())
            .unwrap_or_default()
    }

    fn update(&self, apply: impl FnOnce(&mut ViewModel)) {
        if let Ok(mut model) = self.model.write() {
            apply(&mut model);
        }
    }
}

impl AppView for InMemoryAppView {
    fn show_page(&self, page: AppPage) {
        self.update(|model| model.current_page = page);
    }

    fn set_server_list(&self, servers: &[DisplayServer]) {
        self.update(|model| model.server_list = servers.to_vec());
    }

    fn select_server(&self, server: Option<&DisplayServer>) {
        self.update(|model| model.selected_server = server.cloned());
    }

    fn show_error_banner(&self, banner: &ErrorBanner) {
        self.update(|model| model.error_banner = Some(banner.clone()));
    }

    fn clear_error_banner(&self) {
        self.update(|model| model.error_banner = None);
    }
}
