pub mod category;
pub mod label;
pub mod reorder;
pub mod sorting;

pub use category::{Category, LabelWall, WallConfig};
pub use label::{CategoryCode, Label, LabelId};
pub use reorder::{reorder, DropPosition, MoveTarget, OrderChange, ReorderOutcome};
pub use sorting::{search_labels, sort_labels, SortField, SortOrder};
