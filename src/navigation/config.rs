//! Navigation controller settings.

use crate::server::services::ProvisioningConfig;

/// Settings for [`NavigationController`](super::services::NavigationController).
///
/// # Examples
///
/// ```
/// use relaydeck::navigation::config::NavigationConfig;
///
/// let config = NavigationConfig::default();
/// assert!(config.reset_timeout_on_progress);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationConfig {
    /// Timings for background provisioning waiters.
    pub provisioning: ProvisioningConfig,
    /// Whether install progress restarts a waiter's timeout.
    pub reset_timeout_on_progress: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            provisioning: ProvisioningConfig::default(),
            reset_timeout_on_progress: true,
        }
    }
}

impl NavigationConfig {
    /// Millisecond-scale timings for tests and local tooling.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            provisioning: ProvisioningConfig::fast(),
            reset_timeout_on_progress: true,
        }
    }
}
