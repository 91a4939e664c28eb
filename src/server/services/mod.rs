//! Application services for relay server provisioning.

mod provisioning;

pub use provisioning::{ProvisioningConfig, ProvisioningError, ProvisioningWaiter};
