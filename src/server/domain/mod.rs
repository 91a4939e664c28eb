//! Domain model for relay servers.
//!
//! A relay server is either registered manually by the user or provisioned
//! through a cloud provider. Both variants share the capability set held in
//! [`ServerCore`]; [`Server`] is the tagged union the rest of the crate works
//! with.

mod access_key;
mod capabilities;
mod error;
mod health;
mod ids;
mod managed;
mod manual;
mod region;
mod server;

pub use access_key::{AccessKey, DataLimit, DataUsage};
pub use capabilities::ServerCore;
pub use error::ServerDomainError;
pub use health::{ServerHealthSnapshot, ServerHealthStatus};
pub use ids::{AccessKeyId, HostId, ManagementApiUrl, ServerId, ServerName};
pub use managed::{InstallState, ManagedHost, ManagedServer, ManagedServerData};
pub use manual::{CertificateFingerprint, ManualServer, ManualServerConfig};
pub use region::{RegionId, RegionMap};
pub use server::{Server, ServerKind};
