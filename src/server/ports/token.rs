//! Credential storage port for the cloud provider.

use crate::storage::ports::KeyValueStoreError;
use async_trait::async_trait;
use thiserror::Error;

/// Result type for token manager operations.
pub type TokenManagerResult<T> = Result<T, TokenManagerError>;

/// Holds at most one cloud credential.
///
/// No stored token means the session has no managed-server capability.
#[async_trait]
pub trait TokenManager: Send + Sync {
    /// Returns the stored token, if any.
    async fn stored_token(&self) -> TokenManagerResult<Option<String>>;

    /// Stores `token`, replacing any previous one.
    async fn write_token(&self, token: &str) -> TokenManagerResult<()>;

    /// Removes the stored token.
    async fn remove_token(&self) -> TokenManagerResult<()>;
}

/// Errors returned by token manager implementations.
#[derive(Debug, Clone, Error)]
pub enum TokenManagerError {
    /// The token is empty after trimming.
    #[error("cloud token must not be empty")]
    EmptyToken,

    /// Storage failure.
    #[error(transparent)]
    Storage(#[from] KeyValueStoreError),
}
