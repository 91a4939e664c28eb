//! Relay servers and the registries that own them.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The provisioning waiter in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
