use crate::domain::label::LabelId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShelfwiseError>;

#[derive(Debug, Error)]
pub enum ShelfwiseError {
    #[error("Label not found: {0}")]
    LabelNotFound(LabelId),

    #[error("Invalid label ID format: {0}")]
    InvalidLabelId(String),

    #[error("Invalid category code: {0:?}")]
    InvalidCategoryCode(String),

    #[error("Category already exists: {0}")]
    DuplicateCategory(String),

    #[error("Label wall not initialized")]
    WallNotInitialized,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "sqlite-storage")]
impl From<rusqlite::Error> for ShelfwiseError {
    fn from(err: rusqlite::Error) -> Self {
        ShelfwiseError::StorageError(err.to_string())
    }
}
