//! In-memory adapters for relay server ports.

mod cloud;

pub use cloud::InMemoryCloudSession;
