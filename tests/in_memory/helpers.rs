//! Shared test helpers for in-memory navigation integration tests.

use eyre::{WrapErr, eyre};
use mockable::DefaultClock;
use relaydeck::{
    display::DisplayServerCache,
    navigation::{
        adapters::InMemoryAppView,
        config::NavigationConfig,
        services::{NavigationController, NavigationPorts, ProvisioningNotice},
    },
    server::{
        adapters::{
            CloudManagedServerRegistry, CloudRegistryConfig, KeyValueManualServerRegistry,
            KeyValueTokenManager, memory::InMemoryCloudSession,
        },
        domain::{HostId, ManagedServer, RegionId},
        ports::{ManagedServerRegistry, TokenManager},
    },
    storage::adapters::InMemoryKeyValueStore,
};
use rstest::fixture;
use std::sync::Arc;
use std::time::Duration;

/// Cloud session used by the integration tests.
pub type TestSession = InMemoryCloudSession<DefaultClock>;

/// Managed registry used by the integration tests.
pub type TestManagedRegistry = CloudManagedServerRegistry<TestSession>;

/// Controller wired to in-memory adapters.
pub type TestController = NavigationController<
    KeyValueManualServerRegistry<InMemoryKeyValueStore>,
    TestManagedRegistry,
    KeyValueTokenManager<InMemoryKeyValueStore>,
    InMemoryKeyValueStore,
    InMemoryAppView,
>;

/// Longest time a test waits for one provisioning result.
pub const UPDATE_WAIT: Duration = Duration::from_secs(5);

/// Application state that outlives a single controller.
///
/// Building a second controller over the same harness simulates an
/// application restart.
pub struct Harness {
    pub store: Arc<InMemoryKeyValueStore>,
    pub session: TestSession,
    pub view: Arc<InMemoryAppView>,
}

impl Harness {
    /// Creates empty storage and an empty cloud account.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryKeyValueStore::new()),
            session: InMemoryCloudSession::new(DefaultClock),
            view: Arc::new(InMemoryAppView::new()),
        }
    }

    /// Builds a controller with millisecond-scale provisioning timings.
    #[must_use]
    pub fn controller(&self) -> TestController {
        self.controller_with(NavigationConfig::fast())
    }

    /// Builds a controller with explicit settings.
    #[must_use]
    pub fn controller_with(&self, config: NavigationConfig) -> TestController {
        NavigationController::new(
            NavigationPorts {
                manual: Arc::new(self.manual_registry()),
                managed: Arc::new(self.managed_registry()),
                tokens: Arc::new(self.tokens()),
                store: Arc::clone(&self.store),
                view: Arc::clone(&self.view),
            },
            config,
        )
    }

    /// Returns a manual registry over the shared store.
    #[must_use]
    pub fn manual_registry(&self) -> KeyValueManualServerRegistry<InMemoryKeyValueStore> {
        KeyValueManualServerRegistry::new(Arc::clone(&self.store))
    }

    /// Returns a managed registry over the shared cloud session.
    #[must_use]
    pub fn managed_registry(&self) -> TestManagedRegistry {
        CloudManagedServerRegistry::new(
            Arc::new(self.session.clone()),
            CloudRegistryConfig::default(),
        )
    }

    /// Returns a token manager over the shared store.
    #[must_use]
    pub fn tokens(&self) -> KeyValueTokenManager<InMemoryKeyValueStore> {
        KeyValueTokenManager::new(Arc::clone(&self.store))
    }

    /// Returns the display cache over the shared store.
    #[must_use]
    pub fn cache(&self) -> DisplayServerCache<InMemoryKeyValueStore> {
        DisplayServerCache::new(Arc::clone(&self.store))
    }

    /// Stores a cloud token without verifying it.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be stored.
    pub async fn store_token(&self) -> eyre::Result<()> {
        self.tokens()
            .write_token("test-token")
            .await
            .wrap_err("store cloud token")
    }

    /// Creates a host directly through the managed registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be created.
    pub async fn seed_managed(&self, region: &str) -> eyre::Result<ManagedServer> {
        let region_id = RegionId::new(region).wrap_err("valid region")?;
        self.managed_registry()
            .create_server(&region_id)
            .await
            .wrap_err("seed managed server")
    }

    /// Creates a host and completes its install at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be created or completed.
    pub async fn seed_ready_managed(&self, api_url: &str) -> eyre::Result<HostId> {
        let server = self.seed_managed("nyc1").await?;
        self.session
            .complete_install(server.host_id(), api_url)
            .wrap_err("complete seeded install")?;
        Ok(server.host_id())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Provides fresh application state for each test.
#[fixture]
pub fn harness() -> Harness {
    Harness::new()
}

/// Formats installer output for a manual server.
#[must_use]
pub fn manual_input(api_url: &str) -> String {
    format!(r#"{{"apiUrl":"{api_url}","certSha256":"AB:CD:EF"}}"#)
}

/// Waits for the next provisioning result and applies it.
///
/// # Errors
///
/// Returns an error if no result arrives within [`UPDATE_WAIT`].
pub async fn next_update(controller: &mut TestController) -> eyre::Result<ProvisioningNotice> {
    tokio::time::timeout(UPDATE_WAIT, controller.next_provisioning_update())
        .await
        .wrap_err("waiting for provisioning result")?
        .ok_or_else(|| eyre!("provisioning channel closed"))
}
