//! Capability set shared by manual and managed servers.

use super::{
    AccessKey, AccessKeyId, DataLimit, DataUsage, ManagementApiUrl, ServerDomainError,
    ServerHealthSnapshot, ServerId, ServerName,
};
use serde::{Deserialize, Serialize};

/// Identity, naming, metrics, access keys, and usage for one relay server.
///
/// Both [`ManualServer`](super::ManualServer) and
/// [`ManagedServer`](super::ManagedServer) embed this type and expose it
/// through `core()` and `core_mut()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCore {
    id: ServerId,
    name: ServerName,
    management_api_url: ManagementApiUrl,
    metrics_enabled: bool,
    access_keys: Vec<AccessKey>,
    next_access_key_id: u64,
    default_data_limit: Option<DataLimit>,
    data_usage: DataUsage,
    last_health: Option<ServerHealthSnapshot>,
}

impl ServerCore {
    /// Creates the capability set for a freshly registered server.
    #[must_use]
    pub fn new(id: ServerId, name: ServerName, management_api_url: ManagementApiUrl) -> Self {
        Self {
            id,
            name,
            management_api_url,
            metrics_enabled: false,
            access_keys: Vec::new(),
            next_access_key_id: 0,
            default_data_limit: None,
            data_usage: DataUsage::default(),
            last_health: None,
        }
    }

    /// Returns the immutable server identifier.
    #[must_use]
    pub const fn id(&self) -> ServerId {
        self.id
    }

    /// Returns the server name.
    #[must_use]
    pub const fn name(&self) -> &ServerName {
        &self.name
    }

    /// Renames the server.
    pub fn rename(&mut self, name: ServerName) {
        self.name = name;
    }

    /// Returns the management API URL.
    #[must_use]
    pub const fn management_api_url(&self) -> &ManagementApiUrl {
        &self.management_api_url
    }

    /// Returns whether anonymous metrics sharing is enabled.
    #[must_use]
    pub const fn metrics_enabled(&self) -> bool {
        self.metrics_enabled
    }

    /// Enables or disables metrics sharing.
    pub const fn set_metrics_enabled(&mut self, enabled: bool) {
        self.metrics_enabled = enabled;
    }

    /// Returns access keys in creation order.
    #[must_use]
    pub fn access_keys(&self) -> &[AccessKey] {
        &self.access_keys
    }

    /// Creates an access key. Blank names fall back to `Key <id>`.
    pub fn add_access_key(&mut self, name: Option<&str>) -> AccessKey {
        let id = AccessKeyId::new(self.next_access_key_id.to_string());
        self.next_access_key_id = self.next_access_key_id.saturating_add(1);
        let label = name
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or_else(|| format!("Key {id}"), str::to_owned);
        let key = AccessKey::new(id, label);
        self.access_keys.push(key.clone());
        key
    }

    /// Renames an access key.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError::AccessKeyNotFound`] for unknown keys.
    pub fn rename_access_key(
        &mut self,
        key_id: &AccessKeyId,
        name: &str,
    ) -> Result<(), ServerDomainError> {
        self.access_key_mut(key_id)?.rename(name.trim().to_owned());
        Ok(())
    }

    /// Deletes an access key and its usage record.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError::AccessKeyNotFound`] for unknown keys.
    pub fn remove_access_key(&mut self, key_id: &AccessKeyId) -> Result<(), ServerDomainError> {
        let before = self.access_keys.len();
        self.access_keys.retain(|key| key.id() != key_id);
        if self.access_keys.len() == before {
            return Err(ServerDomainError::AccessKeyNotFound(key_id.clone()));
        }
        self.data_usage.forget(key_id);
        Ok(())
    }

    /// Sets or clears the data limit of a single access key.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError::AccessKeyNotFound`] for unknown keys.
    pub fn set_access_key_data_limit(
        &mut self,
        key_id: &AccessKeyId,
        limit: Option<DataLimit>,
    ) -> Result<(), ServerDomainError> {
        self.access_key_mut(key_id)?.set_data_limit(limit);
        Ok(())
    }

    /// Returns the limit applied to keys without their own limit.
    #[must_use]
    pub const fn default_data_limit(&self) -> Option<DataLimit> {
        self.default_data_limit
    }

    /// Sets or clears the server-wide default data limit.
    pub fn set_default_data_limit(&mut self, limit: Option<DataLimit>) {
        self.default_data_limit = limit;
    }

    /// Returns the limit that applies to `key_id`: its own limit, else the
    /// server default.
    #[must_use]
    pub fn effective_data_limit(&self, key_id: &AccessKeyId) -> Option<DataLimit> {
        self.access_keys
            .iter()
            .find(|key| key.id() == key_id)
            .and_then(AccessKey::data_limit)
            .or(self.default_data_limit)
    }

    /// Returns the data usage snapshot.
    #[must_use]
    pub const fn data_usage(&self) -> &DataUsage {
        &self.data_usage
    }

    /// Adds transferred bytes to an access key's usage.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError::AccessKeyNotFound`] for unknown keys.
    pub fn record_data_usage(
        &mut self,
        key_id: &AccessKeyId,
        bytes: u64,
    ) -> Result<(), ServerDomainError> {
        self.access_key_mut(key_id)?;
        self.data_usage.add(key_id.clone(), bytes);
        Ok(())
    }

    /// Returns keys whose usage reached their effective limit.
    #[must_use]
    pub fn keys_over_limit(&self) -> Vec<AccessKeyId> {
        self.access_keys
            .iter()
            .filter(|key| {
                self.effective_data_limit(key.id())
                    .is_some_and(|limit| self.data_usage.bytes_for(key.id()) >= limit.bytes())
            })
            .map(|key| key.id().clone())
            .collect()
    }

    /// Returns the latest health observation.
    #[must_use]
    pub const fn last_health(&self) -> Option<&ServerHealthSnapshot> {
        self.last_health.as_ref()
    }

    /// Stores a new health observation.
    pub fn record_health(&mut self, snapshot: ServerHealthSnapshot) {
        self.last_health = Some(snapshot);
    }

    fn access_key_mut(&mut self, key_id: &AccessKeyId) -> Result<&mut AccessKey, ServerDomainError> {
        self.access_keys
            .iter_mut()
            .find(|key| key.id() == key_id)
            .ok_or_else(|| ServerDomainError::AccessKeyNotFound(key_id.clone()))
    }
}
