//! Relay server health snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reachability of a relay server's management API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerHealthStatus {
    /// Health has not been checked yet.
    Unknown,
    /// The management API answered.
    Healthy,
    /// The management API did not answer or reported an error.
    Unhealthy,
}

impl ServerHealthStatus {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for ServerHealthStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Timestamped health observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerHealthSnapshot {
    status: ServerHealthStatus,
    checked_at: DateTime<Utc>,
    message: Option<String>,
}

impl ServerHealthSnapshot {
    /// Records a healthy observation.
    #[must_use]
    pub const fn healthy(checked_at: DateTime<Utc>) -> Self {
        Self {
            status: ServerHealthStatus::Healthy,
            checked_at,
            message: None,
        }
    }

    /// Records an unhealthy observation with a diagnostic message.
    #[must_use]
    pub fn unhealthy(checked_at: DateTime<Utc>, message: impl Into<String>) -> Self {
        let normalized = message.into().trim().to_owned();
        Self {
            status: ServerHealthStatus::Unhealthy,
            checked_at,
            message: (!normalized.is_empty()).then_some(normalized),
        }
    }

    /// Returns the observed status.
    #[must_use]
    pub const fn status(&self) -> ServerHealthStatus {
        self.status
    }

    /// Returns when the observation was made.
    #[must_use]
    pub const fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    /// Returns the diagnostic message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
