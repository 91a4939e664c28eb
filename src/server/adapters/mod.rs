//! Adapter implementations for relay server registry ports.

pub mod memory;

mod cloud_registry;
mod manual_registry;
mod token;

pub use cloud_registry::{
    API_URL_KEY, CloudManagedServerRegistry, CloudRegistryConfig, INSTALL_COMPLETED_KEY,
    INSTALL_FAILED_KEY, INSTALL_PROGRESS_KEY,
};
pub use manual_registry::{KeyValueManualServerRegistry, MANUAL_SERVERS_KEY};
pub use token::{CLOUD_TOKEN_KEY, KeyValueTokenManager};
