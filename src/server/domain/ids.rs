//! Identifier and validated-name types for relay servers.

use super::ServerDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length for a server name.
const MAX_SERVER_NAME_LENGTH: usize = 100;

/// Scheme used for management URLs of hosts whose install has not published
/// a real URL yet.
const PENDING_HOST_SCHEME: &str = "pending://host/";

/// Namespace for identifiers derived from cloud host ids.
const HOST_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_9b7d_4c1e_8a35_0d42_b7e9_c301);

/// Immutable identifier of a relay server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(Uuid);

impl ServerId {
    /// Creates a new random server identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derives the identifier of a cloud-managed server from its host id.
    ///
    /// The same host always yields the same identifier.
    #[must_use]
    pub fn for_host(host_id: HostId) -> Self {
        Self(Uuid::new_v5(&HOST_ID_NAMESPACE, host_id.to_string().as_bytes()))
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ServerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a cloud host backing a managed server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(u64);

impl HostId {
    /// Wraps a provider host id.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the provider host id.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Management API URL, the identity key shared by every registry and the
/// display cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagementApiUrl(String);

impl ManagementApiUrl {
    /// Creates a management URL from user or provider input.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError::EmptyApiUrl`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ServerDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ServerDomainError::EmptyApiUrl);
        }
        Ok(Self(normalized))
    }

    /// Returns the provisional URL for a host that is still installing.
    #[must_use]
    pub fn pending_host(host_id: HostId) -> Self {
        Self(format!("{PENDING_HOST_SCHEME}{host_id}"))
    }

    /// Returns whether this is a provisional URL.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.0.starts_with(PENDING_HOST_SCHEME)
    }

    /// Returns the host a provisional URL stands for.
    #[must_use]
    pub fn pending_host_id(&self) -> Option<HostId> {
        self.0
            .strip_prefix(PENDING_HOST_SCHEME)
            .and_then(|suffix| suffix.parse::<u64>().ok())
            .map(HostId::new)
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ManagementApiUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ManagementApiUrl {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Validated, user-visible server name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerName(String);

impl ServerName {
    /// Creates a validated server name. The input is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError`] when the name is empty or too long.
    pub fn new(value: impl Into<String>) -> Result<Self, ServerDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ServerDomainError::EmptyServerName);
        }
        if normalized.chars().count() > MAX_SERVER_NAME_LENGTH {
            return Err(ServerDomainError::ServerNameTooLong(normalized));
        }
        Ok(Self(normalized))
    }

    /// Creates a name without failing: blank input becomes `fallback` and
    /// overlong input is truncated.
    pub(crate) fn lenient(value: &str, fallback: &str) -> Self {
        let trimmed = value.trim();
        let chosen = if trimmed.is_empty() { fallback } else { trimmed };
        Self(chosen.chars().take(MAX_SERVER_NAME_LENGTH).collect())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Identifier of an access key, unique within one server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessKeyId(String);

impl AccessKeyId {
    /// Wraps a key identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessKeyId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
