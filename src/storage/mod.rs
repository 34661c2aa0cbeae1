use crate::{
    domain::{sorting, Label, LabelId, LabelWall, OrderChange, WallConfig},
    error::Result,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(feature = "file-storage")]
pub mod file_storage;
pub mod memory_storage;

#[cfg(feature = "sqlite-storage")]
pub mod sqlite_storage;

#[cfg(feature = "file-storage")]
pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;
#[cfg(feature = "sqlite-storage")]
pub use sqlite_storage::SqliteStorage;

/// Storage trait for persisting labels and wall state.
///
/// This is the persistence side of a reorder: the changeset produced by the
/// engine is handed to [`Storage::apply_changes`], which must be idempotent
/// for a given `{id, category, order}` triple.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initializes the storage backend
    async fn initialize(&self) -> Result<()>;

    /// Saves a label
    async fn save_label(&self, label: &Label) -> Result<()>;

    /// Loads a label by ID
    async fn load_label(&self, id: LabelId) -> Result<Label>;

    /// Lists all labels in ascending ID order
    async fn list_labels(&self) -> Result<Vec<Label>>;

    /// Searches label names and descriptions (case-insensitive)
    async fn search_labels(&self, query: &str) -> Result<Vec<Label>> {
        let labels = self.list_labels().await?;
        Ok(sorting::search_labels(&labels, query)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Deletes a label
    async fn delete_label(&self, id: LabelId) -> Result<()>;

    /// Writes the final placement of every label in `changes`.
    ///
    /// Fails with `LabelNotFound` on the first change whose label is gone;
    /// changes before it stay applied.
    async fn apply_changes(&self, changes: &[OrderChange]) -> Result<()> {
        for change in changes {
            let mut label = self.load_label(change.id).await?;
            label.category = change.category.clone();
            label.order = change.order;
            self.save_label(&label).await?;
        }
        Ok(())
    }

    /// Saves the wall configuration, ID counter and every label on it.
    /// Stored labels that are no longer on the wall are removed.
    async fn save_wall(&self, wall: &LabelWall) -> Result<()>;

    /// Loads the wall together with all stored labels
    async fn load_wall(&self) -> Result<LabelWall>;

    /// Checks if the wall is initialized
    async fn is_initialized(&self) -> bool;
}

/// On-disk shape of the wall header; labels are stored separately
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WallHeader {
    pub config: WallConfig,
    pub next_label_id: u32,
}

impl WallHeader {
    pub fn from_wall(wall: &LabelWall) -> Self {
        Self {
            config: wall.config.clone(),
            next_label_id: wall.next_label_id,
        }
    }

    pub fn into_wall(self, labels: Vec<Label>) -> LabelWall {
        LabelWall {
            config: self.config,
            labels,
            next_label_id: self.next_label_id,
        }
    }
}

impl Default for WallHeader {
    fn default() -> Self {
        Self::from_wall(&LabelWall::default())
    }
}
