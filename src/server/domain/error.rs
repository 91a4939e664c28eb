//! Error types for relay server domain validation.

use super::AccessKeyId;
use thiserror::Error;

/// Errors returned while constructing or mutating server domain values.
///
/// These are user-input validation failures: they are reported to the caller
/// and never change any state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServerDomainError {
    /// The manual server configuration is not a JSON object.
    #[error("server configuration is not valid JSON: {0}")]
    MalformedConfig(String),

    /// The management API URL is missing or empty.
    #[error("management API URL must not be empty")]
    EmptyApiUrl,

    /// The certificate fingerprint is missing or empty.
    #[error("certificate fingerprint must not be empty")]
    EmptyCertificateFingerprint,

    /// The server name is empty after trimming.
    #[error("server name must not be empty")]
    EmptyServerName,

    /// The server name exceeds the length limit.
    #[error("server name exceeds 100 character limit: {0}")]
    ServerNameTooLong(String),

    /// The region identifier is empty after trimming.
    #[error("region identifier must not be empty")]
    EmptyRegion,

    /// The access key does not exist on the server.
    #[error("access key {0} not found")]
    AccessKeyNotFound(AccessKeyId),
}
