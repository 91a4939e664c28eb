//! Port contracts for relay server registries and their collaborators.

mod cloud;
mod managed;
mod manual;
mod token;

pub use cloud::{
    CloudAccount, CloudSession, CloudSessionError, CloudSessionResult, Droplet, DropletSize,
    DropletSpec, RegionInfo,
};
pub use managed::{ManagedServerRegistry, ManagedServerRegistryError, ManagedServerRegistryResult};
pub use manual::{ManualServerRegistry, ManualServerRegistryError, ManualServerRegistryResult};
pub use token::{TokenManager, TokenManagerError, TokenManagerResult};
