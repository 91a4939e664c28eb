//! In-memory cloud provider session.

use crate::server::{
    adapters::{API_URL_KEY, INSTALL_COMPLETED_KEY, INSTALL_FAILED_KEY, INSTALL_PROGRESS_KEY},
    domain::HostId,
    ports::{
        CloudAccount, CloudSession, CloudSessionError, CloudSessionResult, Droplet, DropletSize,
        DropletSpec, RegionInfo,
    },
};
use async_trait::async_trait;
use mockable::Clock;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// In-memory cloud provider.
///
/// Hosts never install on their own: tests drive install progress through
/// [`report_progress`](Self::report_progress),
/// [`complete_install`](Self::complete_install), and
/// [`fail_install`](Self::fail_install). Clones share state.
pub struct InMemoryCloudSession<C>
where
    C: Clock + Send + Sync,
{
    clock: Arc<C>,
    state: Arc<RwLock<InMemoryCloudState>>,
}

impl<C> Clone for InMemoryCloudSession<C>
where
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            clock: Arc::clone(&self.clock),
            state: Arc::clone(&self.state),
        }
    }
}

#[derive(Debug)]
struct InMemoryCloudState {
    droplets: BTreeMap<HostId, Droplet>,
    user_data: HashMap<HostId, String>,
    regions: Vec<RegionInfo>,
    sizes: HashMap<String, DropletSize>,
    next_id: u64,
    unreachable: bool,
}

fn default_regions() -> Vec<RegionInfo> {
    [
        ("nyc1", "New York 1", true),
        ("nyc3", "New York 3", true),
        ("ams3", "Amsterdam 3", true),
        ("sgp1", "Singapore 1", true),
        ("lon1", "London 1", false),
    ]
    .into_iter()
    .map(|(slug, name, available)| RegionInfo {
        slug: slug.to_owned(),
        name: name.to_owned(),
        available,
        sizes: vec!["s-1vcpu-1gb".to_owned()],
    })
    .collect()
}

fn default_sizes() -> HashMap<String, DropletSize> {
    let size = DropletSize {
        slug: "s-1vcpu-1gb".to_owned(),
        price_monthly_usd: 6,
        transfer_terabytes: 1,
    };
    HashMap::from([(size.slug.clone(), size)])
}

impl<C> InMemoryCloudSession<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a provider with a few default regions and one host size.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            clock: Arc::new(clock),
            state: Arc::new(RwLock::new(InMemoryCloudState {
                droplets: BTreeMap::new(),
                user_data: HashMap::new(),
                regions: default_regions(),
                sizes: default_sizes(),
                next_id: 1000,
                unreachable: false,
            })),
        }
    }

    /// Makes every call fail with a transport error while `unreachable`.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn set_unreachable(&self, unreachable: bool) -> CloudSessionResult<()> {
        self.write_state()?.unreachable = unreachable;
        Ok(())
    }

    /// Publishes install progress for a host.
    ///
    /// # Errors
    ///
    /// Returns [`CloudSessionError::Rejected`] for unknown hosts.
    pub fn report_progress(&self, id: HostId, percent: u8) -> CloudSessionResult<()> {
        self.publish(id, INSTALL_PROGRESS_KEY, percent.to_string())
    }

    /// Marks a host's install as finished with `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudSessionError::Rejected`] for unknown hosts.
    pub fn complete_install(&self, id: HostId, api_url: &str) -> CloudSessionResult<()> {
        self.publish(id, API_URL_KEY, api_url.to_owned())?;
        self.publish(id, INSTALL_COMPLETED_KEY, "true".to_owned())
    }

    /// Marks a host's install as failed.
    ///
    /// # Errors
    ///
    /// Returns [`CloudSessionError::Rejected`] for unknown hosts.
    pub fn fail_install(&self, id: HostId, reason: &str) -> CloudSessionResult<()> {
        self.publish(id, INSTALL_FAILED_KEY, reason.to_owned())
    }

    /// Returns the install script a host was created with.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn user_data(&self, id: HostId) -> CloudSessionResult<Option<String>> {
        Ok(self.read_state()?.user_data.get(&id).cloned())
    }

    /// Returns how many hosts exist.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn droplet_count(&self) -> CloudSessionResult<usize> {
        Ok(self.read_state()?.droplets.len())
    }

    fn publish(&self, id: HostId, key: &str, value: String) -> CloudSessionResult<()> {
        let mut state = self.write_state()?;
        let droplet = state
            .droplets
            .get_mut(&id)
            .ok_or_else(|| not_found(id))?;
        droplet.key_values.insert(key.to_owned(), value);
        Ok(())
    }

    fn read_state(&self) -> CloudSessionResult<std::sync::RwLockReadGuard<'_, InMemoryCloudState>> {
        self.state
            .read()
            .map_err(|err| CloudSessionError::transport(std::io::Error::other(err.to_string())))
    }

    fn write_state(
        &self,
    ) -> CloudSessionResult<std::sync::RwLockWriteGuard<'_, InMemoryCloudState>> {
        self.state
            .write()
            .map_err(|err| CloudSessionError::transport(std::io::Error::other(err.to_string())))
    }

    fn reachable_state(
        &self,
    ) -> CloudSessionResult<std::sync::RwLockWriteGuard<'_, InMemoryCloudState>> {
        let state = self.write_state()?;
        if state.unreachable {
            return Err(CloudSessionError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "cloud provider unreachable",
            )));
        }
        Ok(state)
    }
}

fn not_found(id: HostId) -> CloudSessionError {
    CloudSessionError::Rejected {
        status: 404,
        message: format!("droplet {id} not found"),
    }
}

#[async_trait]
impl<C> CloudSession for InMemoryCloudSession<C>
where
    C: Clock + Send + Sync,
{
    async fn get_account(&self) -> CloudSessionResult<CloudAccount> {
        self.reachable_state()?;
        Ok(CloudAccount {
            email: "operator@example.test".to_owned(),
            email_verified: true,
            host_limit: 10,
        })
    }

    async fn create_droplet(
        &self,
        name: &str,
        region: &str,
        _ssh_public_key: &str,
        spec: &DropletSpec,
    ) -> CloudSessionResult<Droplet> {
        let created_at = self.clock.utc();
        let mut state = self.reachable_state()?;
        let size = state
            .sizes
            .get(&spec.size_slug)
            .cloned()
            .ok_or_else(|| CloudSessionError::Rejected {
                status: 422,
                message: format!("unknown size {}", spec.size_slug),
            })?;
        let id = HostId::new(state.next_id);
        state.next_id = state.next_id.saturating_add(1);
        let droplet = Droplet {
            id,
            name: name.to_owned(),
            region: region.to_owned(),
            size,
            created_at,
            tags: spec.tags.clone(),
            key_values: BTreeMap::new(),
        };
        state.droplets.insert(id, droplet.clone());
        state.user_data.insert(id, spec.user_data.clone());
        Ok(droplet)
    }

    async fn get_droplet(&self, id: HostId) -> CloudSessionResult<Option<Droplet>> {
        let state = self.reachable_state()?;
        Ok(state.droplets.get(&id).cloned())
    }

    async fn get_droplets_by_tag(&self, tag: &str) -> CloudSessionResult<Vec<Droplet>> {
        let state = self.reachable_state()?;
        Ok(state
            .droplets
            .values()
            .filter(|droplet| droplet.tags.iter().any(|candidate| candidate == tag))
            .cloned()
            .collect())
    }

    async fn delete_droplet(&self, id: HostId) -> CloudSessionResult<()> {
        let mut state = self.reachable_state()?;
        state.droplets.remove(&id).ok_or_else(|| not_found(id))?;
        state.user_data.remove(&id);
        Ok(())
    }

    async fn get_region_info(&self) -> CloudSessionResult<Vec<RegionInfo>> {
        let state = self.reachable_state()?;
        Ok(state.regions.clone())
    }
}
