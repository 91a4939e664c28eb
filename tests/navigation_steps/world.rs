//! Shared world state for navigation BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use relaydeck::{
    display::DisplayServer,
    navigation::{
        adapters::InMemoryAppView,
        config::NavigationConfig,
        services::{NavigationController, NavigationError, NavigationPorts, ProvisioningNotice},
    },
    server::adapters::{
        CloudManagedServerRegistry, CloudRegistryConfig, KeyValueManualServerRegistry,
        KeyValueTokenManager, memory::InMemoryCloudSession,
    },
    storage::adapters::InMemoryKeyValueStore,
};
use rstest::fixture;

/// Cloud session used by the BDD world.
pub type TestSession = InMemoryCloudSession<DefaultClock>;

/// Controller type used by the BDD world.
pub type TestController = NavigationController<
    KeyValueManualServerRegistry<InMemoryKeyValueStore>,
    CloudManagedServerRegistry<TestSession>,
    KeyValueTokenManager<InMemoryKeyValueStore>,
    InMemoryKeyValueStore,
    InMemoryAppView,
>;

/// Longest time a step waits for one provisioning result.
pub const UPDATE_WAIT: Duration = Duration::from_secs(5);

/// Scenario world for navigation behaviour tests.
pub struct NavigationWorld {
    pub store: Arc<InMemoryKeyValueStore>,
    pub session: TestSession,
    pub view: Arc<InMemoryAppView>,
    pub controller: TestController,
    pub last_created: Option<DisplayServer>,
    pub last_error: Option<NavigationError>,
    pub last_notice: Option<ProvisioningNotice>,
}

impl NavigationWorld {
    /// Creates a world with empty storage and an empty cloud account.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryKeyValueStore::new());
        let session = InMemoryCloudSession::new(DefaultClock);
        let view = Arc::new(InMemoryAppView::new());
        let controller = NavigationController::new(
            NavigationPorts {
                manual: Arc::new(KeyValueManualServerRegistry::new(Arc::clone(&store))),
                managed: Arc::new(CloudManagedServerRegistry::new(
                    Arc::new(session.clone()),
                    CloudRegistryConfig::default(),
                )),
                tokens: Arc::new(KeyValueTokenManager::new(Arc::clone(&store))),
                store: Arc::clone(&store),
                view: Arc::clone(&view),
            },
            NavigationConfig::fast(),
        );

        Self {
            store,
            session,
            view,
            controller,
            last_created: None,
            last_error: None,
            last_notice: None,
        }
    }
}

impl Default for NavigationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> NavigationWorld {
    NavigationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
