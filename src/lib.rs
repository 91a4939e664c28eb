//! Relaydeck: relay server management core.
//!
//! This crate keeps track of VPN relay servers that are either added by hand
//! or provisioned through a cloud provider, and decides what the desktop
//! application shows while cloud installs are still running.
//!
//! # Architecture
//!
//! Relaydeck follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (key-value stores,
//!   cloud sessions, views)
//! - **Services**: Orchestration over ports
//!
//! # Modules
//!
//! - [`storage`]: Key-value storage port and adapters
//! - [`server`]: Manual and managed relay servers, registries, provisioning
//! - [`display`]: Cached display projection of the server list
//! - [`navigation`]: Startup reconciliation and page navigation

pub mod display;
pub mod navigation;
pub mod server;
pub mod storage;
