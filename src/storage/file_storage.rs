use crate::{
    domain::{Label, LabelId, LabelWall},
    error::{Result, ShelfwiseError},
    storage::{Storage, WallHeader},
};
use async_trait::async_trait;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::fs;

/// File-based storage implementation
pub struct FileStorage {
    root_path: PathBuf,
}

impl FileStorage {
    const SHELFWISE_DIR: &'static str = ".shelfwise";
    const LABELS_DIR: &'static str = "labels";
    const WALL_FILE: &'static str = "wall.json";

    /// Creates a new FileStorage instance for the given project root
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::SHELFWISE_DIR),
        }
    }

    fn labels_dir(&self) -> PathBuf {
        self.root_path.join(Self::LABELS_DIR)
    }

    fn wall_file(&self) -> PathBuf {
        self.root_path.join(Self::WALL_FILE)
    }

    fn label_file(&self, id: LabelId) -> PathBuf {
        self.labels_dir().join(format!("{}.json", id))
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    async fn write_header(&self, header: &WallHeader) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;

        let json = serde_json::to_string_pretty(header)?;
        fs::write(self.wall_file(), json).await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;
        self.ensure_directory_exists(&self.labels_dir()).await?;

        if !self.wall_file().exists() {
            self.write_header(&WallHeader::default()).await?;
            tracing::info!(path = %self.root_path.display(), "Created label wall");
        }

        let gitignore_path = self.root_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(gitignore_path, "# Local caches\n*.db\n*.db-*\n").await?;
        }

        Ok(())
    }

    async fn save_label(&self, label: &Label) -> Result<()> {
        self.ensure_directory_exists(&self.labels_dir()).await?;

        let json = serde_json::to_string_pretty(label)?;
        fs::write(self.label_file(label.id), json).await?;
        Ok(())
    }

    async fn load_label(&self, id: LabelId) -> Result<Label> {
        let file_path = self.label_file(id);

        if !file_path.exists() {
            return Err(ShelfwiseError::LabelNotFound(id));
        }

        let contents = fs::read_to_string(&file_path).await?;
        let label: Label = serde_json::from_str(&contents)?;

        Ok(label)
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        let labels_dir = self.labels_dir();

        if !labels_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&labels_dir).await?;
        let mut labels: Vec<Label> = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            match LabelId::from_str(stem) {
                Ok(id) => labels.push(self.load_label(id).await?),
                Err(_) => tracing::warn!(file = %path.display(), "Skipping unrecognized label file"),
            }
        }

        labels.sort_by_key(|l| l.id);
        Ok(labels)
    }

    async fn delete_label(&self, id: LabelId) -> Result<()> {
        let file_path = self.label_file(id);

        if !file_path.exists() {
            return Err(ShelfwiseError::LabelNotFound(id));
        }

        fs::remove_file(file_path).await?;
        Ok(())
    }

    async fn save_wall(&self, wall: &LabelWall) -> Result<()> {
        self.write_header(&WallHeader::from_wall(wall)).await?;

        for label in &wall.labels {
            self.save_label(label).await?;
        }

        // Labels deleted from the wall must not come back on reload
        let kept: HashSet<LabelId> = wall.labels.iter().map(|l| l.id).collect();
        let mut entries = fs::read_dir(self.labels_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let stale = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|stem| LabelId::from_str(stem).ok())
                .is_some_and(|id| !kept.contains(&id));
            if stale {
                fs::remove_file(&path).await?;
                tracing::debug!(file = %path.display(), "Removed deleted label");
            }
        }

        Ok(())
    }

    async fn load_wall(&self) -> Result<LabelWall> {
        let wall_file = self.wall_file();

        if !wall_file.exists() {
            return Err(ShelfwiseError::WallNotInitialized);
        }

        let contents = fs::read_to_string(&wall_file).await?;
        let header: WallHeader = serde_json::from_str(&contents)?;
        let labels = self.list_labels().await?;

        Ok(header.into_wall(labels))
    }

    async fn is_initialized(&self) -> bool {
        self.root_path.exists() && self.wall_file().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryCode, DropPosition, MoveTarget, OrderChange};
    use tempfile::TempDir;

    fn code(s: &str) -> CategoryCode {
        CategoryCode::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_storage_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        assert!(!storage.is_initialized().await);

        storage.initialize().await.unwrap();

        assert!(storage.is_initialized().await);
        assert!(storage.labels_dir().exists());
        assert!(storage.wall_file().exists());
    }

    #[tokio::test]
    async fn test_label_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let mut label = Label::new(LabelId::new(1), "Garage".to_string(), code("storage"), 0);
        label.set_color("#AA5500".to_string());
        storage.save_label(&label).await.unwrap();

        let loaded = storage.load_label(label.id).await.unwrap();
        assert_eq!(loaded, label);
    }

    #[tokio::test]
    async fn test_load_missing_label() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let err = storage.load_label(LabelId::new(9)).await.unwrap_err();
        assert!(matches!(err, ShelfwiseError::LabelNotFound(_)));

        let err = storage.delete_label(LabelId::new(9)).await.unwrap_err();
        assert!(matches!(err, ShelfwiseError::LabelNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_labels_sorted_by_id() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        for id in [10, 2, 7] {
            let label = Label::new(LabelId::new(id), format!("L{}", id), code("other"), 0);
            storage.save_label(&label).await.unwrap();
        }
        fs::write(storage.labels_dir().join("notes.json"), "{}")
            .await
            .unwrap();

        let ids: Vec<u32> = storage
            .list_labels()
            .await
            .unwrap()
            .iter()
            .map(|l| l.id.get())
            .collect();
        assert_eq!(ids, vec![2, 7, 10]);
    }

    #[tokio::test]
    async fn test_wall_round_trip_and_reorder_sync() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await?;

        let mut wall = LabelWall::default();
        wall.create_label("Attic".to_string(), code("storage"));
        wall.create_label("Garage".to_string(), code("storage"));
        wall.create_label("Donate".to_string(), code("todo"));
        storage.save_wall(&wall).await?;

        let changes = wall.move_label(
            LabelId::new(2),
            &MoveTarget::new(code("todo"), DropPosition::Index(0)),
        );
        storage.apply_changes(&changes).await?;
        // Replaying the same changeset is harmless
        storage.apply_changes(&changes).await?;

        let loaded = storage.load_wall().await?;
        assert_eq!(loaded.next_label_id, 4);
        assert_eq!(loaded.labels, wall.labels);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_wall_drops_deleted_labels() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let mut wall = LabelWall::default();
        wall.create_label("Attic".to_string(), code("storage"));
        wall.create_label("Garage".to_string(), code("storage"));
        storage.save_wall(&wall).await.unwrap();

        wall.delete_label(LabelId::new(1)).unwrap();
        wall.normalize();
        storage.save_wall(&wall).await.unwrap();

        assert!(!storage.label_file(LabelId::new(1)).exists());
        let loaded = storage.load_wall().await.unwrap();
        assert_eq!(loaded.labels, wall.labels);
        assert!(crate::domain::reorder::check_contiguity(&loaded.labels));
    }

    #[tokio::test]
    async fn test_apply_changes_missing_label() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let change = OrderChange {
            id: LabelId::new(3),
            category: code("todo"),
            order: 0,
        };
        let err = storage.apply_changes(&[change]).await.unwrap_err();
        assert!(matches!(err, ShelfwiseError::LabelNotFound(_)));
    }

    #[tokio::test]
    async fn test_load_wall_uninitialized() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        let err = storage.load_wall().await.unwrap_err();
        assert!(matches!(err, ShelfwiseError::WallNotInitialized));
    }

    #[tokio::test]
    async fn test_search_labels_by_name_and_description() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.initialize().await.unwrap();

        let first = Label::new(LabelId::new(1), "Winter Clothes".to_string(), code("storage"), 0);
        let mut second = Label::new(LabelId::new(2), "Boxes".to_string(), code("storage"), 1);
        second.set_description("Holds winter boots".to_string());
        let third = Label::new(LabelId::new(3), "Garden".to_string(), code("other"), 0);

        storage.save_label(&first).await.unwrap();
        storage.save_label(&second).await.unwrap();
        storage.save_label(&third).await.unwrap();

        let results = storage.search_labels("WINTER").await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(storage.search_labels("nothing").await.unwrap().is_empty());
    }
}
