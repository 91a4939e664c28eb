//! Manually registered relay servers.

use super::{ManagementApiUrl, ServerCore, ServerDomainError, ServerId, ServerName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name given to a manual server whose URL has no recognisable host.
const DEFAULT_MANUAL_SERVER_NAME: &str = "Relay server";

/// SHA-256 fingerprint of a server's self-signed certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateFingerprint(String);

impl CertificateFingerprint {
    /// Creates a fingerprint from user input.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError::EmptyCertificateFingerprint`] when the
    /// value is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ServerDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ServerDomainError::EmptyCertificateFingerprint);
        }
        Ok(Self(normalized))
    }

    /// Returns the fingerprint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CertificateFingerprint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Connection details the user supplies for a manual server.
///
/// The serialised form uses the same field names the server's installer
/// prints (`apiUrl`, `certSha256`). Input is only read through
/// [`ManualServerConfig::from_json`], which validates both fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManualServerConfig {
    #[serde(rename = "apiUrl")]
    api_url: ManagementApiUrl,
    #[serde(rename = "certSha256")]
    certificate_fingerprint: CertificateFingerprint,
}

#[derive(Debug, Deserialize)]
struct RawManualServerConfig {
    #[serde(rename = "apiUrl", default)]
    api_url: Option<String>,
    #[serde(rename = "certSha256", default)]
    cert_sha256: Option<String>,
}

impl ManualServerConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError`] when either field is empty.
    pub fn new(
        api_url: impl Into<String>,
        certificate_fingerprint: impl Into<String>,
    ) -> Result<Self, ServerDomainError> {
        Ok(Self {
            api_url: ManagementApiUrl::new(api_url)?,
            certificate_fingerprint: CertificateFingerprint::new(certificate_fingerprint)?,
        })
    }

    /// Parses the JSON object printed by the server installer.
    ///
    /// Text around the outermost braces is ignored, so the installer's whole
    /// output line can be pasted.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError::MalformedConfig`] when no JSON object can
    /// be read, or a field error when `apiUrl` or `certSha256` is missing.
    pub fn from_json(input: &str) -> Result<Self, ServerDomainError> {
        let object = extract_json_object(input)
            .ok_or_else(|| ServerDomainError::MalformedConfig("no JSON object found".to_owned()))?;
        let raw: RawManualServerConfig = serde_json::from_str(object)
            .map_err(|err| ServerDomainError::MalformedConfig(err.to_string()))?;
        Self::new(
            raw.api_url.unwrap_or_default(),
            raw.cert_sha256.unwrap_or_default(),
        )
    }

    /// Returns the management API URL.
    #[must_use]
    pub const fn api_url(&self) -> &ManagementApiUrl {
        &self.api_url
    }

    /// Returns the certificate fingerprint.
    #[must_use]
    pub const fn certificate_fingerprint(&self) -> &CertificateFingerprint {
        &self.certificate_fingerprint
    }
}

fn extract_json_object(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    if end < start {
        return None;
    }
    input.get(start..=end)
}

/// A relay server registered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualServer {
    core: ServerCore,
    certificate_fingerprint: CertificateFingerprint,
}

impl ManualServer {
    /// Creates a server from validated configuration. The name defaults to
    /// the host part of the management URL.
    #[must_use]
    pub fn new(config: ManualServerConfig) -> Self {
        let name = ServerName::lenient(url_host(config.api_url.as_str()), DEFAULT_MANUAL_SERVER_NAME);
        Self {
            core: ServerCore::new(ServerId::new(), name, config.api_url),
            certificate_fingerprint: config.certificate_fingerprint,
        }
    }

    /// Returns the shared capability set.
    #[must_use]
    pub const fn core(&self) -> &ServerCore {
        &self.core
    }

    /// Returns the shared capability set for mutation.
    pub const fn core_mut(&mut self) -> &mut ServerCore {
        &mut self.core
    }

    /// Returns the certificate fingerprint.
    #[must_use]
    pub const fn certificate_fingerprint(&self) -> &CertificateFingerprint {
        &self.certificate_fingerprint
    }

    /// Returns whether this server was registered with `config`.
    #[must_use]
    pub fn matches(&self, config: &ManualServerConfig) -> bool {
        self.core.management_api_url() == config.api_url()
    }
}

fn url_host(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme
        .split(['/', ':'])
        .next()
        .unwrap_or(without_scheme)
}
