use crate::{
    domain::{CategoryCode, Label, LabelId, LabelWall, OrderChange},
    error::{Result, ShelfwiseError},
    storage::{Storage, WallHeader},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::{collections::HashSet, path::Path};
use tokio::sync::Mutex;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS labels (
        id          INTEGER PRIMARY KEY,
        category    TEXT NOT NULL,
        position    INTEGER NOT NULL,
        name        TEXT NOT NULL,
        color       TEXT,
        description TEXT,
        item_count  INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_labels_category ON labels(category, position);
    CREATE TABLE IF NOT EXISTS wall (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

const SELECT_LABEL: &str = "SELECT id, category, position, name, color, description, item_count, created_at, updated_at FROM labels";

/// A label row before its text columns are validated
struct LabelRow {
    id: u32,
    category: String,
    position: u32,
    name: String,
    color: Option<String>,
    description: Option<String>,
    item_count: u32,
    created_at: String,
    updated_at: String,
}

impl LabelRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            category: row.get(1)?,
            position: row.get(2)?,
            name: row.get(3)?,
            color: row.get(4)?,
            description: row.get(5)?,
            item_count: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_label(self) -> Result<Label> {
        Ok(Label {
            id: LabelId::new(self.id),
            category: CategoryCode::new(self.category)?,
            order: self.position,
            name: self.name,
            color: self.color,
            description: self.description,
            item_count: self.item_count,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ShelfwiseError::StorageError(format!("bad timestamp {:?}: {}", value, e)))
}

fn upsert_label(conn: &Connection, label: &Label) -> Result<()> {
    conn.execute(
        "INSERT INTO labels (id, category, position, name, color, description, item_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
            category = excluded.category,
            position = excluded.position,
            name = excluded.name,
            color = excluded.color,
            description = excluded.description,
            item_count = excluded.item_count,
            updated_at = excluded.updated_at",
        params![
            label.id.get(),
            label.category.as_str(),
            label.order,
            label.name,
            label.color,
            label.description,
            label.item_count,
            label.created_at.to_rfc3339(),
            label.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// SQLite-based storage backend for labels and wall state
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    const WALL_KEY: &'static str = "wall";

    /// Opens (or creates) a database file
    pub fn new(database_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(database_path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn write_header(conn: &Connection, header: &WallHeader) -> Result<()> {
        let json = serde_json::to_string(header)?;
        conn.execute(
            "INSERT INTO wall (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![Self::WALL_KEY, json],
        )?;
        Ok(())
    }

    fn read_header(conn: &Connection) -> Result<Option<WallHeader>> {
        let json: Option<String> = conn
            .query_row(
                "SELECT value FROM wall WHERE key = ?1",
                params![Self::WALL_KEY],
                |row| row.get(0),
            )
            .optional()?;

        json.map(|j| serde_json::from_str(&j).map_err(ShelfwiseError::from))
            .transpose()
    }

    fn read_labels(conn: &Connection) -> Result<Vec<Label>> {
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_LABEL))?;
        let rows = stmt
            .query_map([], LabelRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(LabelRow::into_label).collect()
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch(SCHEMA)?;

        if Self::read_header(&conn)?.is_none() {
            Self::write_header(&conn, &WallHeader::default())?;
            tracing::info!("Created label wall in SQLite");
        }
        Ok(())
    }

    async fn save_label(&self, label: &Label) -> Result<()> {
        let conn = self.conn.lock().await;
        upsert_label(&conn, label)
    }

    async fn load_label(&self, id: LabelId) -> Result<Label> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_LABEL),
                params![id.get()],
                LabelRow::from_row,
            )
            .optional()?;

        row.ok_or(ShelfwiseError::LabelNotFound(id))?.into_label()
    }

    async fn list_labels(&self) -> Result<Vec<Label>> {
        let conn = self.conn.lock().await;
        Self::read_labels(&conn)
    }

    async fn delete_label(&self, id: LabelId) -> Result<()> {
        let conn = self.conn.lock().await;
        let deleted = conn.execute("DELETE FROM labels WHERE id = ?1", params![id.get()])?;

        if deleted == 0 {
            return Err(ShelfwiseError::LabelNotFound(id));
        }
        Ok(())
    }

    /// Applies the whole changeset in one transaction; a missing label rolls
    /// everything back.
    async fn apply_changes(&self, changes: &[OrderChange]) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        for change in changes {
            let updated = tx.execute(
                "UPDATE labels SET category = ?1, position = ?2 WHERE id = ?3",
                params![change.category.as_str(), change.order, change.id.get()],
            )?;
            if updated == 0 {
                return Err(ShelfwiseError::LabelNotFound(change.id));
            }
        }

        tx.commit()?;
        Ok(())
    }

    async fn save_wall(&self, wall: &LabelWall) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        Self::write_header(&tx, &WallHeader::from_wall(wall))?;
        for label in &wall.labels {
            upsert_label(&tx, label)?;
        }

        let kept: HashSet<u32> = wall.labels.iter().map(|l| l.id.get()).collect();
        let stored: Vec<u32> = {
            let mut stmt = tx.prepare("SELECT id FROM labels")?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<u32>>>()?;
            ids
        };
        for id in stored.into_iter().filter(|id| !kept.contains(id)) {
            tx.execute("DELETE FROM labels WHERE id = ?1", params![id])?;
        }

        tx.commit()?;
        Ok(())
    }

    async fn load_wall(&self) -> Result<LabelWall> {
        let conn = self.conn.lock().await;
        let header = Self::read_header(&conn)?.ok_or(ShelfwiseError::WallNotInitialized)?;
        let labels = Self::read_labels(&conn)?;

        Ok(header.into_wall(labels))
    }

    async fn is_initialized(&self) -> bool {
        let conn = self.conn.lock().await;
        matches!(Self::read_header(&conn), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DropPosition, MoveTarget};

    fn code(s: &str) -> CategoryCode {
        CategoryCode::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_initialization() {
        let storage = SqliteStorage::in_memory().unwrap();
        assert!(!storage.is_initialized().await);

        storage.initialize().await.unwrap();
        assert!(storage.is_initialized().await);

        let wall = storage.load_wall().await.unwrap();
        assert_eq!(wall.next_label_id, 1);
        assert!(wall.labels.is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_reorder_sync() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.initialize().await.unwrap();

        let mut wall = LabelWall::default();
        wall.create_label("Attic".to_string(), code("storage"));
        wall.create_label("Garage".to_string(), code("storage"));
        wall.create_label("Donate".to_string(), code("todo"));
        storage.save_wall(&wall).await.unwrap();

        let changes = wall.move_label(
            LabelId::new(1),
            &MoveTarget::new(code("todo"), DropPosition::Before(LabelId::new(3))),
        );
        storage.apply_changes(&changes).await.unwrap();

        let loaded = storage.load_wall().await.unwrap();
        let placements: Vec<(u32, String, u32)> = loaded
            .labels
            .iter()
            .map(|l| (l.id.get(), l.category.to_string(), l.order))
            .collect();
        assert_eq!(
            placements,
            vec![
                (1, "todo".to_string(), 0),
                (2, "storage".to_string(), 0),
                (3, "todo".to_string(), 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_sqlite_save_wall_drops_deleted_labels() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.initialize().await.unwrap();

        let mut wall = LabelWall::default();
        wall.create_label("Attic".to_string(), code("storage"));
        wall.create_label("Garage".to_string(), code("storage"));
        storage.save_wall(&wall).await.unwrap();

        wall.delete_label(LabelId::new(1)).unwrap();
        wall.normalize();
        storage.save_wall(&wall).await.unwrap();

        let loaded = storage.load_wall().await.unwrap();
        let ids: Vec<u32> = loaded.labels.iter().map(|l| l.id.get()).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(loaded.labels[0].order, 0);
        assert!(matches!(
            storage.load_label(LabelId::new(1)).await,
            Err(ShelfwiseError::LabelNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sqlite_apply_changes_is_atomic() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.initialize().await.unwrap();

        let label = Label::new(LabelId::new(1), "Tools".to_string(), code("storage"), 0);
        storage.save_label(&label).await.unwrap();

        let changes = vec![
            OrderChange {
                id: LabelId::new(1),
                category: code("todo"),
                order: 0,
            },
            OrderChange {
                id: LabelId::new(2),
                category: code("todo"),
                order: 1,
            },
        ];
        let err = storage.apply_changes(&changes).await.unwrap_err();
        assert!(matches!(err, ShelfwiseError::LabelNotFound(_)));

        let reloaded = storage.load_label(LabelId::new(1)).await.unwrap();
        assert_eq!(reloaded.category.as_str(), "storage");
    }
}
