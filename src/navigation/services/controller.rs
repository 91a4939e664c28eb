//! Server-state reconciliation and navigation.

use super::reconcile::{SourceState, reconcile};
use crate::display::{DisplayServer, DisplayServerCache, make_display_server};
use crate::navigation::{
    config::NavigationConfig,
    domain::{AppPage, ErrorBanner},
    ports::AppView,
};
use crate::server::{
    domain::{
        HostId, ManagedServer, ManagementApiUrl, ManualServerConfig, RegionId, Server,
        ServerDomainError, ServerName,
    },
    ports::{
        CloudAccount, ManagedServerRegistry, ManagedServerRegistryError, ManualServerRegistry,
        ManualServerRegistryError, TokenManager, TokenManagerError,
    },
    services::{ProvisioningError, ProvisioningWaiter},
};
use crate::storage::ports::KeyValueStore;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};

/// Errors returned by [`NavigationController`] operations.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// User input was rejected; nothing changed.
    #[error(transparent)]
    Validation(#[from] ServerDomainError),

    /// The manual server registry failed.
    #[error(transparent)]
    ManualRegistry(#[from] ManualServerRegistryError),

    /// The managed server registry failed.
    #[error(transparent)]
    ManagedRegistry(#[from] ManagedServerRegistryError),

    /// The token manager failed.
    #[error(transparent)]
    Token(#[from] TokenManagerError),

    /// Creating managed servers needs a connected cloud account.
    #[error("no cloud account is connected")]
    CloudAccountRequired,

    /// No listed server has this id.
    #[error("server {0} is not in the server list")]
    UnknownServer(ManagementApiUrl),

    /// The operation does not apply to this kind of server.
    #[error("server {0} does not support this operation")]
    UnsupportedOperation(ManagementApiUrl),

    /// No failed install is tracked for this host.
    #[error("no failed install is tracked for host {0}")]
    NothingToRetry(HostId),
}

/// Result type for navigation operations.
pub type NavigationResult<T> = Result<T, NavigationError>;

/// Outcome of one provisioning waiter, as applied by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningNotice {
    /// The install completed and the list entry was replaced.
    Ready(DisplayServer),
    /// The install failed or timed out; the host stays tracked for retry.
    Failed(ErrorBanner),
    /// The host is no longer tracked, so the result was dropped.
    Ignored(HostId),
}

/// Ports the controller drives.
#[derive(Debug)]
pub struct NavigationPorts<Mn, Mg, T, K, V> {
    /// Manual server registry.
    pub manual: Arc<Mn>,
    /// Managed server registry.
    pub managed: Arc<Mg>,
    /// Cloud credential storage.
    pub tokens: Arc<T>,
    /// Key-value store backing the display cache.
    pub store: Arc<K>,
    /// UI sink.
    pub view: Arc<V>,
}

struct ProvisioningUpdate {
    host_id: HostId,
    result: Result<ManagedServer, ProvisioningError>,
}

/// A managed host whose install has not completed.
struct TrackedInstall {
    display_id: ManagementApiUrl,
    server: ManagedServer,
    failure: Option<ErrorBanner>,
}

/// Owns navigation state and keeps the server list, the display cache and
/// the UI consistent.
///
/// Background provisioning waiters report over a channel; their results are
/// applied by [`next_provisioning_update`](Self::next_provisioning_update) or
/// [`apply_pending_updates`](Self::apply_pending_updates), never concurrently
/// with another operation.
pub struct NavigationController<Mn, Mg, T, K, V>
where
    Mn: ManualServerRegistry,
    Mg: ManagedServerRegistry + 'static,
    T: TokenManager,
    K: KeyValueStore,
    V: AppView,
{
    manual: Arc<Mn>,
    managed: Arc<Mg>,
    tokens: Arc<T>,
    cache: DisplayServerCache<K>,
    view: Arc<V>,
    waiter: ProvisioningWaiter<Mg>,
    reset_timeout_on_progress: bool,
    updates_tx: UnboundedSender<ProvisioningUpdate>,
    updates_rx: UnboundedReceiver<ProvisioningUpdate>,
    page: AppPage,
    servers: Vec<DisplayServer>,
    selected: Option<ManagementApiUrl>,
    banner: Option<ErrorBanner>,
    managed_hosts: HashMap<ManagementApiUrl, HostId>,
    installs: HashMap<HostId, TrackedInstall>,
}

impl<Mn, Mg, T, K, V> NavigationController<Mn, Mg, T, K, V>
where
    Mn: ManualServerRegistry,
    Mg: ManagedServerRegistry + 'static,
    T: TokenManager,
    K: KeyValueStore,
    V: AppView,
{
    /// Creates a controller on the intro page with an empty list.
    #[must_use]
    pub fn new(ports: NavigationPorts<Mn, Mg, T, K, V>, config: NavigationConfig) -> Self {
        let (updates_tx, updates_rx) = unbounded_channel();
        Self {
            waiter: ProvisioningWaiter::new(Arc::clone(&ports.managed), config.provisioning),
            manual: ports.manual,
            managed: ports.managed,
            tokens: ports.tokens,
            cache: DisplayServerCache::new(ports.store),
            view: ports.view,
            reset_timeout_on_progress: config.reset_timeout_on_progress,
            updates_tx,
            updates_rx,
            page: AppPage::Intro,
            servers: Vec::new(),
            selected: None,
            banner: None,
            managed_hosts: HashMap::new(),
            installs: HashMap::new(),
        }
    }

    /// Returns the current page.
    #[must_use]
    pub const fn current_page(&self) -> AppPage {
        self.page
    }

    /// Returns the server list in display order.
    #[must_use]
    pub fn server_list(&self) -> &[DisplayServer] {
        &self.servers
    }

    /// Returns the selected server.
    #[must_use]
    pub fn selected_server(&self) -> Option<&DisplayServer> {
        self.selected.as_ref().and_then(|id| self.find(id))
    }

    /// Returns the visible provisioning failure banner.
    #[must_use]
    pub const fn error_banner(&self) -> Option<&ErrorBanner> {
        self.banner.as_ref()
    }

    /// Returns the number of hosts whose install is still tracked.
    #[must_use]
    pub fn tracked_install_count(&self) -> usize {
        self.installs.len()
    }

    /// Loads all sources, reconciles them, and picks the landing page.
    ///
    /// Registry failures degrade to cached or empty data and are logged.
    /// Calling `start` again re-reads everything; hosts already being waited
    /// on keep their existing waiter.
    pub async fn start(&mut self) -> AppPage {
        let token = self.tokens.stored_token().await.unwrap_or_else(|err| {
            warn!(error = %err, "cloud token unreadable; skipping managed servers");
            None
        });
        let managed_query = async {
            if token.is_some() {
                Some(self.managed.list_servers().await)
            } else {
                None
            }
        };
        let (cached, last_displayed, manual_result, managed_result) = tokio::join!(
            self.cache.list_servers(),
            self.cache.last_displayed_server_id(),
            self.manual.list_servers(),
            managed_query,
        );

        let manual = manual_result.map_or_else(
            |err| {
                warn!(error = %err, "manual server registry unavailable");
                SourceState::Unreachable
            },
            SourceState::Loaded,
        );
        let managed = match managed_result {
            None => SourceState::Skipped,
            Some(Ok(servers)) => SourceState::Loaded(servers),
            Some(Err(err)) => {
                warn!(error = %err, "managed server registry unavailable");
                SourceState::Unreachable
            }
        };

        let outcome = reconcile(&manual, &managed, cached, last_displayed.as_ref());
        self.servers = outcome.servers;
        self.selected = outcome.selected;
        self.page = outcome.page;
        if outcome.persist {
            self.persist_servers().await;
        }
        self.track_managed(&managed);
        self.banner = self.selected_failure();
        info!(
            page = %self.page,
            servers = self.servers.len(),
            installing = self.installs.len(),
            "navigation started"
        );
        self.publish();
        self.page
    }

    /// Adds a manual server from the installer's JSON output and shows it.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::Validation`] for malformed input, with no
    /// state change, or a registry error when the server cannot be stored.
    pub async fn create_manual_server(&mut self, input: &str) -> NavigationResult<DisplayServer> {
        let config = ManualServerConfig::from_json(input)?;
        let server = self.manual.add_server(config).await?;
        let added = make_display_server(&Server::from(server));
        info!(server = %added.id(), "manual server added");
        self.servers.push(added.clone());
        self.persist_servers().await;
        self.select(added.id().clone()).await;
        self.publish();
        Ok(added)
    }

    /// Requests a managed server in `region` and shows its progress.
    ///
    /// A background waiter follows the install; apply its result with
    /// [`next_provisioning_update`](Self::next_provisioning_update).
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::CloudAccountRequired`] without a stored
    /// token, or the registry error when the host cannot be created.
    pub async fn create_managed_server(
        &mut self,
        region: &RegionId,
    ) -> NavigationResult<DisplayServer> {
        if self.tokens.stored_token().await?.is_none() {
            return Err(NavigationError::CloudAccountRequired);
        }
        let server = self.managed.create_server(region).await?;
        let pending = make_display_server(&Server::from(server.clone()));
        info!(host_id = %server.host_id(), region = %region, "managed server requested");
        self.servers.push(pending.clone());
        self.managed_hosts
            .insert(pending.id().clone(), server.host_id());
        self.track_install(pending.id().clone(), server);
        self.persist_servers().await;
        self.select(pending.id().clone()).await;
        self.publish();
        Ok(pending)
    }

    /// Selects a listed server and remembers it for the next start.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::UnknownServer`] when `id` is not listed.
    pub async fn show_server(&mut self, id: &ManagementApiUrl) -> NavigationResult<AppPage> {
        if self.find(id).is_none() {
            return Err(NavigationError::UnknownServer(id.clone()));
        }
        self.select(id.clone()).await;
        self.publish();
        Ok(self.page)
    }

    /// Restarts the waiter of a host whose install failed or timed out.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::NothingToRetry`] when the host has no
    /// recorded failure.
    pub fn retry_provisioning(&mut self, host_id: HostId) -> NavigationResult<()> {
        let Some(tracked) = self.installs.get_mut(&host_id) else {
            return Err(NavigationError::NothingToRetry(host_id));
        };
        if tracked.failure.take().is_none() {
            return Err(NavigationError::NothingToRetry(host_id));
        }
        let server = tracked.server.clone();
        info!(host_id = %host_id, "retrying provisioning");
        self.spawn_waiter(server);
        self.banner = self.selected_failure();
        self.publish();
        Ok(())
    }

    /// Renames a manual server and refreshes its list entry.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid name,
    /// [`NavigationError::UnsupportedOperation`] for managed servers, or the
    /// registry error.
    pub async fn rename_server(
        &mut self,
        id: &ManagementApiUrl,
        name: &str,
    ) -> NavigationResult<DisplayServer> {
        let new_name = ServerName::new(name)?;
        let listed = self
            .find(id)
            .ok_or_else(|| NavigationError::UnknownServer(id.clone()))?;
        if listed.is_managed() {
            return Err(NavigationError::UnsupportedOperation(id.clone()));
        }
        let mut server = self
            .manual
            .list_servers()
            .await?
            .into_iter()
            .find(|server| server.core().management_api_url() == id)
            .ok_or_else(|| NavigationError::UnknownServer(id.clone()))?;
        server.core_mut().rename(new_name);
        self.manual.update_server(&server).await?;

        let renamed = make_display_server(&Server::from(server));
        for entry in self.servers.iter_mut().filter(|entry| entry.id() == id) {
            *entry = renamed.clone();
        }
        self.persist_servers().await;
        self.publish();
        Ok(renamed)
    }

    /// Forgets every manual server with this URL.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::UnsupportedOperation`] for managed servers
    /// or the registry error.
    pub async fn forget_manual_server(&mut self, id: &ManagementApiUrl) -> NavigationResult<()> {
        let entry = self
            .find(id)
            .ok_or_else(|| NavigationError::UnknownServer(id.clone()))?;
        if entry.is_managed() {
            return Err(NavigationError::UnsupportedOperation(id.clone()));
        }
        let removed = self.manual.forget_server(id).await?;
        info!(server = %id, removed, "manual server forgotten");
        self.remove_entries(id).await;
        Ok(())
    }

    /// Deletes a managed host.
    ///
    /// A waiter still running for the host reports into the void.
    ///
    /// # Errors
    ///
    /// Returns the registry error; the list is left unchanged then.
    pub async fn delete_managed_server(&mut self, host_id: HostId) -> NavigationResult<()> {
        if !self.managed_hosts.values().any(|host| *host == host_id) {
            self.locate_managed_host(host_id).await;
        }
        self.managed.delete_server(host_id).await?;
        info!(host_id = %host_id, "managed server deleted");
        self.installs.remove(&host_id);
        let ids: Vec<ManagementApiUrl> = self
            .managed_hosts
            .iter()
            .filter(|(_, host)| **host == host_id)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &ids {
            self.managed_hosts.remove(id);
            self.remove_entries(id).await;
        }
        if ids.is_empty() {
            debug!(host_id = %host_id, "deleted host was not listed");
        }
        Ok(())
    }

    /// Stores a cloud credential and verifies it.
    ///
    /// On success managed servers are loaded as by [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns the token error, or the registry error when the credential is
    /// refused; the token is removed again in that case.
    pub async fn connect_cloud_account(&mut self, token: &str) -> NavigationResult<CloudAccount> {
        self.tokens.write_token(token).await?;
        let verified = self.managed.account().await;
        if verified.is_err()
            && let Err(err) = self.tokens.remove_token().await
        {
            warn!(error = %err, "failed to discard refused cloud token");
        }
        let account = verified?;
        info!(email = %account.email, "cloud account connected");
        self.start().await;
        Ok(account)
    }

    /// Removes the cloud credential and drops managed servers from the list.
    ///
    /// # Errors
    ///
    /// Returns the token error; nothing else changes then.
    pub async fn disconnect_cloud_account(&mut self) -> NavigationResult<()> {
        self.tokens.remove_token().await?;
        self.installs.clear();
        self.managed_hosts.clear();
        let before = self.servers.len();
        self.servers.retain(|entry| !entry.is_managed());
        info!(
            dropped = before - self.servers.len(),
            "cloud account disconnected"
        );
        self.persist_servers().await;
        self.reselect_if_missing().await;
        self.publish();
        Ok(())
    }

    /// Waits for the next waiter result and applies it.
    ///
    /// Pending forever when no waiter is running; callers bound the wait.
    pub async fn next_provisioning_update(&mut self) -> Option<ProvisioningNotice> {
        let update = self.updates_rx.recv().await?;
        Some(self.apply_update(update).await)
    }

    /// Applies every waiter result delivered so far.
    pub async fn apply_pending_updates(&mut self) -> Vec<ProvisioningNotice> {
        let mut notices = Vec::new();
        while let Ok(update) = self.updates_rx.try_recv() {
            notices.push(self.apply_update(update).await);
        }
        notices
    }

    async fn apply_update(&mut self, update: ProvisioningUpdate) -> ProvisioningNotice {
        let host_id = update.host_id;
        let Some(tracked) = self.installs.get_mut(&host_id) else {
            debug!(host_id = %host_id, "dropping result for untracked host");
            return ProvisioningNotice::Ignored(host_id);
        };
        let err = match update.result {
            Ok(server) => {
                let pending_id = tracked.display_id.clone();
                self.installs.remove(&host_id);
                return self.complete_install(&pending_id, server).await;
            }
            Err(err) => err,
        };
        warn!(host_id = %host_id, error = %err, "provisioning did not finish");
        let banner = ErrorBanner {
            server_id: tracked.display_id.clone(),
            host_id,
            message: err.to_string(),
        };
        tracked.failure = Some(banner.clone());
        self.banner = self.selected_failure();
        self.publish();
        ProvisioningNotice::Failed(banner)
    }

    async fn complete_install(
        &mut self,
        pending_id: &ManagementApiUrl,
        server: ManagedServer,
    ) -> ProvisioningNotice {
        let host_id = server.host_id();
        let ready = make_display_server(&Server::from(server));
        info!(host_id = %host_id, server = %ready.id(), "managed server ready");
        let mut replaced = false;
        for entry in self.servers.iter_mut().filter(|entry| entry.id() == pending_id) {
            *entry = ready.clone();
            replaced = true;
        }
        if !replaced {
            self.servers.push(ready.clone());
        }
        self.managed_hosts.remove(pending_id);
        self.managed_hosts.insert(ready.id().clone(), host_id);
        self.persist_servers().await;
        if self.selected.as_ref() == Some(pending_id) {
            self.select(ready.id().clone()).await;
        }
        self.publish();
        ProvisioningNotice::Ready(ready)
    }

    /// Maps a host that no registry listing reported to its list entry.
    ///
    /// Entries carried over from the cache while the cloud was unreachable
    /// have no recorded host.
    async fn locate_managed_host(&mut self, host_id: HostId) {
        let id = match self.managed.refresh_server(host_id).await {
            Ok(server) => server.core().management_api_url().clone(),
            Err(err) => {
                debug!(host_id = %host_id, error = %err, "could not look up host before deletion");
                ManagementApiUrl::pending_host(host_id)
            }
        };
        if self.find(&id).is_some() {
            self.managed_hosts.insert(id, host_id);
        }
    }

    fn track_managed(&mut self, managed: &SourceState<ManagedServer>) {
        let SourceState::Loaded(servers) = managed else {
            return;
        };
        self.managed_hosts = servers
            .iter()
            .map(|server| (server.core().management_api_url().clone(), server.host_id()))
            .collect();
        self.installs
            .retain(|host_id, _| servers.iter().any(|server| server.host_id() == *host_id));
        for server in servers {
            if server.is_install_completed() {
                self.installs.remove(&server.host_id());
            } else if !self.installs.contains_key(&server.host_id()) {
                self.track_install(server.core().management_api_url().clone(), server.clone());
            }
        }
    }

    fn track_install(&mut self, display_id: ManagementApiUrl, server: ManagedServer) {
        self.installs.insert(
            server.host_id(),
            TrackedInstall {
                display_id,
                server: server.clone(),
                failure: None,
            },
        );
        self.spawn_waiter(server);
    }

    fn spawn_waiter(&self, server: ManagedServer) {
        let waiter = self.waiter.clone();
        let updates = self.updates_tx.clone();
        let reset = self.reset_timeout_on_progress;
        debug!(host_id = %server.host_id(), "spawning provisioning waiter");
        tokio::spawn(async move {
            let host_id = server.host_id();
            let result = waiter.wait_until_ready(&server, reset).await;
            if updates.send(ProvisioningUpdate { host_id, result }).is_err() {
                debug!(host_id = %host_id, "controller gone; dropping provisioning result");
            }
        });
    }

    async fn select(&mut self, id: ManagementApiUrl) {
        self.page = self.find(&id).map_or(AppPage::ServerView, AppPage::for_server);
        if let Err(err) = self.cache.store_last_displayed_server_id(&id).await {
            warn!(error = %err, "failed to remember last displayed server");
        }
        self.selected = Some(id);
        self.banner = self.selected_failure();
    }

    async fn remove_entries(&mut self, id: &ManagementApiUrl) {
        self.servers.retain(|entry| entry.id() != id);
        self.persist_servers().await;
        self.reselect_if_missing().await;
        self.publish();
    }

    async fn reselect_if_missing(&mut self) {
        let still_listed = self
            .selected
            .as_ref()
            .is_some_and(|id| self.find(id).is_some());
        if still_listed {
            return;
        }
        let Some(first) = self.servers.first().map(|first| first.id().clone()) else {
            self.selected = None;
            self.banner = None;
            self.page = AppPage::Intro;
            if let Err(err) = self.cache.clear_last_displayed_server_id().await {
                warn!(error = %err, "failed to clear last displayed server");
            }
            return;
        };
        self.select(first).await;
    }

    async fn persist_servers(&self) {
        if let Err(err) = self.cache.store_servers(&self.servers).await {
            warn!(error = %err, "failed to persist display servers");
        }
    }

    fn selected_failure(&self) -> Option<ErrorBanner> {
        let selected = self.selected.as_ref()?;
        self.installs
            .values()
            .filter(|tracked| &tracked.display_id == selected)
            .find_map(|tracked| tracked.failure.clone())
    }

    fn find(&self, id: &ManagementApiUrl) -> Option<&DisplayServer> {
        self.servers.iter().find(|entry| entry.id() == id)
    }

    fn publish(&self) {
        self.view.set_server_list(&self.servers);
        self.view.select_server(self.selected_server());
        self.banner.as_ref().map_or_else(
            || self.view.clear_error_banner(),
            |banner| self.view.show_error_banner(banner),
        );
        self.view.show_page(self.page);
    }
}
