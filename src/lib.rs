//! # Shelfwise Core
//!
//! Core domain logic for the Shelfwise label wall.
//!
//! Labels are grouped into categories and hold a gapless position inside
//! their category. Dragging a label is a pure reorder over a wall snapshot
//! that yields the new snapshot plus a minimal changeset; the changeset is
//! then written behind a debounce to whichever storage backend is in use.

pub mod domain;
pub mod error;
pub mod storage;
pub mod sync;

// Re-export commonly used types
pub use domain::{
    category::{Category, LabelWall, WallConfig},
    label::{CategoryCode, Label, LabelId},
    reorder::{reorder, DropPosition, MoveTarget, OrderChange, ReorderOutcome},
};
pub use error::{Result, ShelfwiseError};
pub use storage::Storage;
pub use sync::{SyncConfig, SyncEvent, SyncScheduler};
