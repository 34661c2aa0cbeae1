use crate::{
    domain::{Label, LabelId, LabelWall},
    error::{Result, ShelfwiseError},
    storage::{Storage, WallHeader},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Process-local storage, for tests and clients that keep no files
#[derive(Default)]
pub struct MemoryStorage {
    header: RwLock<Option<WallHeader>>,
    labels: RwLock<BTreeMap<LabelId, Label>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn initialize(&self) -> Result<()> {
        let mut header = self.header.write().await;
        if header.is_none() {
            *header = Some(WallHeader::default());
        }
        Ok(())
    }

    async fn save_label(&self, label: &Label) -> Result<()> {
        self.labels.write().await.insert(label.id, label.clone());
        Ok(())
    }

    async fn load_label(&self, id: LabelId) -> Result<Label> {
        self.labels
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ShelfwiseError::LabelNotFound(id))
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        Ok(self.labels.read().await.values().cloned().collect())
    }

    async fn delete_label(&self, id: LabelId) -> Result<()> {
        self.labels
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(ShelfwiseError::LabelNotFound(id))
    }

    async fn save_wall(&self, wall: &LabelWall) -> Result<()> {
        *self.header.write().await = Some(WallHeader::from_wall(wall));

        *self.labels.write().await = wall
            .labels
            .iter()
            .map(|label| (label.id, label.clone()))
            .collect();
        Ok(())
    }

    async fn load_wall(&self) -> Result<LabelWall> {
        let header = self
            .header
            .read()
            .await
            .clone()
            .ok_or(ShelfwiseError::WallNotInitialized)?;
        let labels = self.list_labels().await?;

        Ok(header.into_wall(labels))
    }

    async fn is_initialized(&self) -> bool {
        self.header.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryCode, DropPosition, MoveTarget};

    #[tokio::test]
    async fn test_memory_storage_wall_round_trip() {
        let storage = MemoryStorage::new();
        assert!(!storage.is_initialized().await);
        assert!(matches!(
            storage.load_wall().await,
            Err(ShelfwiseError::WallNotInitialized)
        ));

        storage.initialize().await.unwrap();
        assert!(storage.is_initialized().await);

        let todo = CategoryCode::new("todo").unwrap();
        let mut wall = LabelWall::default();
        wall.create_label("Paint fence".to_string(), todo.clone());
        wall.create_label("Fix shelf".to_string(), todo.clone());
        storage.save_wall(&wall).await.unwrap();

        let changes = wall.move_label(LabelId::new(2), &MoveTarget::new(todo, DropPosition::Index(0)));
        storage.apply_changes(&changes).await.unwrap();

        let loaded = storage.load_wall().await.unwrap();
        assert_eq!(loaded.labels, wall.labels);
    }

    #[tokio::test]
    async fn test_save_wall_drops_deleted_labels() {
        let storage = MemoryStorage::new();
        storage.initialize().await.unwrap();

        let shelf = CategoryCode::new("storage").unwrap();
        let mut wall = LabelWall::default();
        wall.create_label("Attic".to_string(), shelf.clone());
        wall.create_label("Garage".to_string(), shelf);
        storage.save_wall(&wall).await.unwrap();

        wall.delete_label(LabelId::new(1)).unwrap();
        wall.normalize();
        storage.save_wall(&wall).await.unwrap();

        let loaded = storage.load_wall().await.unwrap();
        assert_eq!(loaded.labels, wall.labels);
        assert!(crate::domain::reorder::check_contiguity(&loaded.labels));
    }

    #[tokio::test]
    async fn test_memory_storage_delete() {
        let storage = MemoryStorage::new();
        let label = Label::new(
            LabelId::new(1),
            "Tools".to_string(),
            CategoryCode::new("storage").unwrap(),
            0,
        );
        storage.save_label(&label).await.unwrap();

        storage.delete_label(label.id).await.unwrap();
        assert!(storage.list_labels().await.unwrap().is_empty());
        assert!(storage.delete_label(label.id).await.is_err());
    }
}
