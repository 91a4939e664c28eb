//! Cached display projection of every known relay server.
//!
//! The cache lets the application render its server list before any
//! registry answers, and survives restarts. Entries are copied snapshots,
//! never live server handles.

mod cache;
mod domain;

pub use cache::{
    CorruptCacheError, DISPLAY_SERVERS_KEY, DisplayServerCache, LAST_DISPLAYED_SERVER_KEY,
};
pub use domain::{DisplayInstallState, DisplayServer, make_display_server};
