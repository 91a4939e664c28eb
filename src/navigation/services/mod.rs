//! Navigation orchestration.

mod controller;
mod reconcile;

pub use controller::{
    NavigationController, NavigationError, NavigationPorts, NavigationResult, ProvisioningNotice,
};
