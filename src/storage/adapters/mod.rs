//! Adapter implementations for the key-value storage port.

mod directory;
mod memory;

pub use directory::DirectoryKeyValueStore;
pub use memory::InMemoryKeyValueStore;
