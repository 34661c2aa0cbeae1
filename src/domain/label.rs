use crate::error::ShelfwiseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Unique, immutable identifier for a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(u32);

impl LabelId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl FromStr for LabelId {
    type Err = ShelfwiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| ShelfwiseError::InvalidLabelId(s.to_string()))
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of the category a label is grouped under (e.g. "storage", "todo")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CategoryCode(pub(crate) String);

impl CategoryCode {
    /// Creates a category code, rejecting empty codes and anything outside `[a-z0-9_-]`
    pub fn new(code: impl Into<String>) -> Result<Self, ShelfwiseError> {
        let code = code.into();
        let valid = !code.is_empty()
            && code
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');

        if valid {
            Ok(Self(code))
        } else {
            Err(ShelfwiseError::InvalidCategoryCode(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryCode {
    type Err = ShelfwiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CategoryCode {
    type Error = ShelfwiseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<CategoryCode> for String {
    fn from(code: CategoryCode) -> Self {
        code.0
    }
}

/// A label on the wall.
///
/// Only `category` and `order` are ever rewritten by a reorder; everything
/// else is presentational and travels through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub category: CategoryCode,
    pub order: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub item_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Label {
    /// Creates a new label at the given position of a category
    pub fn new(id: LabelId, name: String, category: CategoryCode, order: u32) -> Self {
        let now = Utc::now();
        Self {
            id,
            category,
            order,
            name,
            color: None,
            description: None,
            item_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
        self.updated_at = Utc::now();
    }

    /// Sets the display color (hex, e.g. "#FF5733")
    pub fn set_color(&mut self, color: String) {
        self.color = Some(color);
        self.updated_at = Utc::now();
    }

    pub fn clear_color(&mut self) {
        self.color = None;
        self.updated_at = Utc::now();
    }

    pub fn set_description(&mut self, description: String) {
        self.description = Some(description);
        self.updated_at = Utc::now();
    }

    pub fn set_item_count(&mut self, count: u32) {
        self.item_count = count;
        self.updated_at = Utc::now();
    }

    /// Returns the `(category, order)` pair that reorders manipulate
    pub fn placement(&self) -> (&CategoryCode, u32) {
        (&self.category, self.order)
    }
}
