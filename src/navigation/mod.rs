//! Reconciliation and navigation.
//!
//! [`services::NavigationController`] merges the manual registry, the
//! managed registry, and the display cache into one server list and decides
//! which page the user sees. It writes to the UI only through
//! [`ports::AppView`].

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;
