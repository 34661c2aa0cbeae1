//! Debounced persistence of reorder changesets.
//!
//! Provides:
//! - `SyncConfig` - quiescence window and maximum delay
//! - `PendingChanges` - last-write-wins buffer of unsynced placements
//! - `SyncScheduler` - cancellable timer that flushes the buffer to a `Storage`

mod config;
mod pending;
mod scheduler;

pub use config::SyncConfig;
pub use pending::PendingChanges;
pub use scheduler::{SyncEvent, SyncScheduler};
