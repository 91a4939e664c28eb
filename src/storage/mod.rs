//! Key-value persistence used by the registries, the token manager, and the
//! display cache.
//!
//! The storage engine itself lives outside this crate. Everything here talks
//! to it through [`ports::KeyValueStore`].

pub mod adapters;
pub mod ports;
