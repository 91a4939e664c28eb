//! Managed server registry backed by a cloud provider session.

use crate::server::{
    domain::{
        HostId, InstallState, ManagedHost, ManagedServer, ManagedServerData, ManagementApiUrl,
        RegionId, RegionMap, ServerName,
    },
    ports::{
        CloudAccount, CloudSession, Droplet, DropletSpec, ManagedServerRegistry,
        ManagedServerRegistryError, ManagedServerRegistryResult,
    },
};
use async_trait::async_trait;
use minijinja::{Environment, context};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Host key-value set to `true` once the install script finished.
pub const INSTALL_COMPLETED_KEY: &str = "install-completed";
/// Host key-value carrying the failure reason when the install failed.
pub const INSTALL_FAILED_KEY: &str = "install-failed";
/// Host key-value carrying install progress, 0 to 100.
pub const INSTALL_PROGRESS_KEY: &str = "install-progress";
/// Host key-value carrying the published management URL.
pub const API_URL_KEY: &str = "api-url";

const DEFAULT_INSTALL_SCRIPT: &str = r#"#!/bin/bash
set -euo pipefail
export RELAY_HOST_NAME="{{ host_name }}"
export RELAY_REGION="{{ region }}"
export RELAY_API_PREFIX="{{ api_prefix }}"
export RELAY_HOST_TAG="{{ tag }}"
curl -sSL https://relaydeck.invalid/install-server.sh | bash -s -- \
  --publish-key-values "{{ progress_key }},{{ completed_key }},{{ failed_key }},{{ api_url_key }}"
"#;

/// Settings for provisioning hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudRegistryConfig {
    /// Tag identifying hosts owned by this application.
    pub tag: String,
    /// Prefix of host names; the region slug is appended.
    pub name_prefix: String,
    /// Provider size slug for new hosts.
    pub size_slug: String,
    /// Provider image slug for new hosts.
    pub image_slug: String,
    /// Public SSH key installed on new hosts.
    pub ssh_public_key: String,
    /// `minijinja` template of the first-boot install script.
    pub install_script_template: String,
}

impl Default for CloudRegistryConfig {
    fn default() -> Self {
        Self {
            tag: "relaydeck".to_owned(),
            name_prefix: "relaydeck".to_owned(),
            size_slug: "s-1vcpu-1gb".to_owned(),
            image_slug: "docker-20-04".to_owned(),
            ssh_public_key: String::new(),
            install_script_template: DEFAULT_INSTALL_SCRIPT.to_owned(),
        }
    }
}

/// Managed server registry over a [`CloudSession`].
///
/// Hosts are discovered by [`CloudRegistryConfig::tag`]; install progress
/// is read from the key-values the install script publishes.
#[derive(Debug, Clone)]
pub struct CloudManagedServerRegistry<S>
where
    S: CloudSession,
{
    session: Arc<S>,
    config: CloudRegistryConfig,
}

impl<S> CloudManagedServerRegistry<S>
where
    S: CloudSession,
{
    /// Creates a registry.
    #[must_use]
    pub const fn new(session: Arc<S>, config: CloudRegistryConfig) -> Self {
        Self { session, config }
    }

    fn render_install_script(
        &self,
        host_name: &str,
        region: &RegionId,
    ) -> ManagedServerRegistryResult<String> {
        let environment = Environment::new();
        environment
            .render_str(
                &self.config.install_script_template,
                context! {
                    host_name => host_name,
                    region => region.as_str(),
                    api_prefix => Uuid::new_v4().simple().to_string(),
                    tag => &self.config.tag,
                    progress_key => INSTALL_PROGRESS_KEY,
                    completed_key => INSTALL_COMPLETED_KEY,
                    failed_key => INSTALL_FAILED_KEY,
                    api_url_key => API_URL_KEY,
                },
            )
            .map_err(|err| ManagedServerRegistryError::InstallScript(err.to_string()))
    }

    async fn ensure_region_available(&self, region: &RegionId) -> ManagedServerRegistryResult<()> {
        if self.get_region_map().await?.contains(region) {
            return Ok(());
        }
        Err(ManagedServerRegistryError::UnsupportedRegion(region.clone()))
    }
}

#[async_trait]
impl<S> ManagedServerRegistry for CloudManagedServerRegistry<S>
where
    S: CloudSession,
{
    async fn account(&self) -> ManagedServerRegistryResult<CloudAccount> {
        Ok(self.session.get_account().await?)
    }

    async fn create_server(&self, region: &RegionId) -> ManagedServerRegistryResult<ManagedServer> {
        self.ensure_region_available(region).await?;
        let host_name = format!("{}-{}", self.config.name_prefix, region);
        let spec = DropletSpec {
            size_slug: self.config.size_slug.clone(),
            image_slug: self.config.image_slug.clone(),
            tags: vec![self.config.tag.clone()],
            user_data: self.render_install_script(&host_name, region)?,
        };
        let droplet = self
            .session
            .create_droplet(&host_name, region.as_str(), &self.config.ssh_public_key, &spec)
            .await?;
        info!(host_id = %droplet.id, %region, "created managed server host");
        managed_server_from_droplet(droplet)
    }

    async fn list_servers(&self) -> ManagedServerRegistryResult<Vec<ManagedServer>> {
        let droplets = self.session.get_droplets_by_tag(&self.config.tag).await?;
        let mut servers = Vec::with_capacity(droplets.len());
        for droplet in droplets {
            let host_id = droplet.id;
            match managed_server_from_droplet(droplet) {
                Ok(server) => servers.push(server),
                Err(err) => warn!(%host_id, error = %err, "skipping unreadable host"),
            }
        }
        servers.sort_by_key(ManagedServer::created_at);
        Ok(servers)
    }

    async fn refresh_server(&self, host_id: HostId) -> ManagedServerRegistryResult<ManagedServer> {
        let droplet = self
            .session
            .get_droplet(host_id)
            .await?
            .ok_or(ManagedServerRegistryError::NotFound(host_id))?;
        managed_server_from_droplet(droplet)
    }

    async fn delete_server(&self, host_id: HostId) -> ManagedServerRegistryResult<()> {
        self.session.delete_droplet(host_id).await?;
        info!(%host_id, "deleted managed server host");
        Ok(())
    }

    async fn get_region_map(&self) -> ManagedServerRegistryResult<RegionMap> {
        let regions = self.session.get_region_info().await?;
        let offered = regions
            .into_iter()
            .filter(|info| info.available && info.sizes.contains(&self.config.size_slug))
            .filter_map(|info| RegionId::new(info.slug).ok());
        Ok(RegionMap::from_regions(offered))
    }
}

fn managed_server_from_droplet(droplet: Droplet) -> ManagedServerRegistryResult<ManagedServer> {
    let region = RegionId::new(droplet.region.as_str()).map_err(|err| {
        ManagedServerRegistryError::InvalidHost {
            host_id: droplet.id,
            reason: err.to_string(),
        }
    })?;
    let management_api_url = droplet
        .key_values
        .get(API_URL_KEY)
        .and_then(|value| ManagementApiUrl::new(value.as_str()).ok());
    let install_state = install_state_from(&droplet.key_values, management_api_url.is_some());
    debug!(host_id = %droplet.id, ?install_state, "read managed server host");

    Ok(ManagedServer::from_data(ManagedServerData {
        host: ManagedHost::new(
            droplet.id,
            region.clone(),
            droplet.size.price_monthly_usd,
            droplet.size.transfer_terabytes,
        ),
        name: ServerName::lenient(&droplet.name, &format!("Relay {region}")),
        management_api_url,
        install_state,
        created_at: droplet.created_at,
    }))
}

fn install_state_from(key_values: &BTreeMap<String, String>, has_api_url: bool) -> InstallState {
    if let Some(reason) = key_values.get(INSTALL_FAILED_KEY) {
        return InstallState::Failed {
            reason: reason.clone(),
        };
    }
    let completed = key_values
        .get(INSTALL_COMPLETED_KEY)
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
    if completed && has_api_url {
        return InstallState::Completed;
    }
    let reported = key_values
        .get(INSTALL_PROGRESS_KEY)
        .and_then(|value| value.trim().parse::<u8>().ok())
        .unwrap_or_default()
        .min(100);
    // Completion without a published URL is not usable yet.
    let progress_percent = if completed { 100 } else { reported };
    InstallState::Installing { progress_percent }
}
