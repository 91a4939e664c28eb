//! Access keys, data limits, and data usage.

use super::AccessKeyId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transfer limit applied to an access key, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataLimit(u64);

impl DataLimit {
    /// Creates a limit of `bytes`.
    #[must_use]
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Returns the limit in bytes.
    #[must_use]
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

/// Credential handed to one relay user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKey {
    id: AccessKeyId,
    name: String,
    data_limit: Option<DataLimit>,
}

impl AccessKey {
    pub(super) fn new(id: AccessKeyId, name: String) -> Self {
        Self {
            id,
            name,
            data_limit: None,
        }
    }

    /// Returns the key identifier.
    #[must_use]
    pub const fn id(&self) -> &AccessKeyId {
        &self.id
    }

    /// Returns the display name of the key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the per-key data limit, if one is set.
    #[must_use]
    pub const fn data_limit(&self) -> Option<DataLimit> {
        self.data_limit
    }

    pub(super) fn rename(&mut self, name: String) {
        self.name = name;
    }

    pub(super) fn set_data_limit(&mut self, limit: Option<DataLimit>) {
        self.data_limit = limit;
    }
}

/// Bytes transferred per access key over the current accounting period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataUsage {
    bytes_by_key: BTreeMap<AccessKeyId, u64>,
}

impl DataUsage {
    /// Returns bytes transferred through `key_id`.
    #[must_use]
    pub fn bytes_for(&self, key_id: &AccessKeyId) -> u64 {
        self.bytes_by_key.get(key_id).copied().unwrap_or_default()
    }

    /// Returns the total across all keys.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.bytes_by_key
            .values()
            .fold(0_u64, |total, bytes| total.saturating_add(*bytes))
    }

    /// Iterates usage entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&AccessKeyId, u64)> {
        self.bytes_by_key.iter().map(|(key, bytes)| (key, *bytes))
    }

    pub(super) fn add(&mut self, key_id: AccessKeyId, bytes: u64) {
        let entry = self.bytes_by_key.entry(key_id).or_default();
        *entry = entry.saturating_add(bytes);
    }

    pub(super) fn forget(&mut self, key_id: &AccessKeyId) {
        self.bytes_by_key.remove(key_id);
    }
}
