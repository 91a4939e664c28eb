//! Waits for a managed server's install to finish.

use crate::server::{
    domain::{HostId, InstallState, ManagedServer},
    ports::{ManagedServerRegistry, ManagedServerRegistryError},
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// Timing settings for [`ProvisioningWaiter`].
///
/// # Examples
///
/// ```
/// use relaydeck::server::services::ProvisioningConfig;
/// use std::time::Duration;
///
/// let config = ProvisioningConfig::default();
/// assert_eq!(config.poll_interval, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisioningConfig {
    /// Delay between two reads of the host.
    pub poll_interval: Duration,
    /// How long the install may go without progress before giving up.
    pub progress_timeout: Duration,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            progress_timeout: Duration::from_secs(10 * 60),
        }
    }
}

impl ProvisioningConfig {
    /// Millisecond-scale timings for tests and local tooling.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
            progress_timeout: Duration::from_millis(250),
        }
    }
}

/// Why a managed server did not become ready.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProvisioningError {
    /// No progress was observed within the timeout.
    #[error("managed server {host_id} made no install progress for {waited:?}")]
    Timeout {
        /// Host identifier.
        host_id: HostId,
        /// Total time spent waiting.
        waited: Duration,
    },

    /// The host reported an install failure or disappeared.
    #[error("managed server {host_id} failed to install: {reason}")]
    Failed {
        /// Host identifier.
        host_id: HostId,
        /// Failure reason.
        reason: String,
    },
}

impl ProvisioningError {
    /// Returns the host the error is about.
    #[must_use]
    pub const fn host_id(&self) -> HostId {
        match self {
            Self::Timeout { host_id, .. } | Self::Failed { host_id, .. } => *host_id,
        }
    }
}

/// Polls a managed server until its install completes, fails, or stalls.
#[derive(Debug)]
pub struct ProvisioningWaiter<M>
where
    M: ManagedServerRegistry,
{
    registry: Arc<M>,
    config: ProvisioningConfig,
}

impl<M> Clone for ProvisioningWaiter<M>
where
    M: ManagedServerRegistry,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            config: self.config,
        }
    }
}

impl<M> ProvisioningWaiter<M>
where
    M: ManagedServerRegistry,
{
    /// Creates a waiter.
    #[must_use]
    pub const fn new(registry: Arc<M>, config: ProvisioningConfig) -> Self {
        Self { registry, config }
    }

    /// Waits until `server` finishes installing and returns its ready state.
    ///
    /// With `reset_timeout_on_progress`, every increase in reported progress
    /// restarts the timeout; otherwise the timeout runs from the first call.
    /// Transport errors while polling are logged and polling continues.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Failed`] when the host reports failure or
    /// no longer exists, and [`ProvisioningError::Timeout`] when the install
    /// stalls.
    pub async fn wait_until_ready(
        &self,
        server: &ManagedServer,
        reset_timeout_on_progress: bool,
    ) -> Result<ManagedServer, ProvisioningError> {
        if server.is_install_completed() {
            return Ok(server.clone());
        }
        let host_id = server.host_id();
        let started = Instant::now();
        let mut deadline = started + self.config.progress_timeout;
        let mut last_progress = server.install_state().progress_percent();

        loop {
            let now = Instant::now();
            if now >= deadline {
                warn!(%host_id, "managed server install timed out");
                return Err(ProvisioningError::Timeout {
                    host_id,
                    waited: now.duration_since(started),
                });
            }
            sleep(self.config.poll_interval.min(deadline - now)).await;

            let current = match self.registry.refresh_server(host_id).await {
                Ok(current) => current,
                Err(ManagedServerRegistryError::NotFound(_)) => {
                    return Err(ProvisioningError::Failed {
                        host_id,
                        reason: "host no longer exists".to_owned(),
                    });
                }
                Err(err) => {
                    warn!(%host_id, error = %err, "could not read managed server host");
                    continue;
                }
            };

            match current.install_state() {
                InstallState::Completed => {
                    info!(%host_id, "managed server install completed");
                    return Ok(current);
                }
                InstallState::Failed { reason } => {
                    return Err(ProvisioningError::Failed {
                        host_id,
                        reason: reason.clone(),
                    });
                }
                InstallState::Installing { progress_percent } => {
                    let progress = Some(*progress_percent);
                    if progress > last_progress {
                        debug!(%host_id, progress_percent, "managed server install progressed");
                        last_progress = progress;
                        if reset_timeout_on_progress {
                            deadline = Instant::now() + self.config.progress_timeout;
                        }
                    }
                }
            }
        }
    }
}
