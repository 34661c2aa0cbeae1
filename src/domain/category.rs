use crate::domain::label::{CategoryCode, Label, LabelId};
use crate::domain::reorder::{self, MoveTarget, OrderChange};
use crate::error::{Result, ShelfwiseError};
use serde::{Deserialize, Serialize};

/// A named bucket labels are grouped under on the wall
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub code: CategoryCode,
    pub display_name: String,
}

impl Category {
    pub fn new(code: CategoryCode, display_name: impl Into<String>) -> Self {
        Self {
            code,
            display_name: display_name.into(),
        }
    }
}

/// Wall configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallConfig {
    pub name: String,
    pub categories: Vec<Category>,
}

impl Default for WallConfig {
    fn default() -> Self {
        let builtin = |code: &str, name: &str| Category {
            code: CategoryCode(code.to_string()),
            display_name: name.to_string(),
        };

        Self {
            name: "Label Wall".to_string(),
            categories: vec![
                builtin("storage", "Storage"),
                builtin("todo", "To Do"),
                builtin("other", "Other"),
            ],
        }
    }
}

/// In-memory label wall state.
///
/// Callers own the wall and hand it around explicitly; reorders go through
/// the pure engine in [`reorder`] and the wall swaps in the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelWall {
    pub config: WallConfig,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub next_label_id: u32,
}

impl LabelWall {
    pub fn new(config: WallConfig) -> Self {
        Self {
            config,
            labels: Vec::new(),
            next_label_id: 1,
        }
    }

    /// Generates the next label ID
    pub fn next_label_id(&mut self) -> LabelId {
        let id = LabelId::new(self.next_label_id);
        self.next_label_id += 1;
        id
    }

    /// Creates a label at the end of `category`
    pub fn create_label(&mut self, name: String, category: CategoryCode) -> &Label {
        let order = self.labels.iter().filter(|l| l.category == category).count() as u32;
        let id = self.next_label_id();
        self.labels.push(Label::new(id, name, category, order));
        &self.labels[self.labels.len() - 1]
    }

    /// Removes a label. Survivors keep their orders; the gap heals on the next
    /// reorder that touches the category.
    pub fn delete_label(&mut self, id: LabelId) -> Result<Label> {
        let pos = self
            .labels
            .iter()
            .position(|l| l.id == id)
            .ok_or(ShelfwiseError::LabelNotFound(id))?;
        Ok(self.labels.remove(pos))
    }

    pub fn label(&self, id: LabelId) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == id)
    }

    pub fn label_mut(&mut self, id: LabelId) -> Option<&mut Label> {
        self.labels.iter_mut().find(|l| l.id == id)
    }

    /// Gets the configured category for a code
    pub fn category(&self, code: &CategoryCode) -> Option<&Category> {
        self.config.categories.iter().find(|c| &c.code == code)
    }

    pub fn add_category(&mut self, category: Category) -> Result<()> {
        if self.category(&category.code).is_some() {
            return Err(ShelfwiseError::DuplicateCategory(category.code.to_string()));
        }
        self.config.categories.push(category);
        Ok(())
    }

    /// Labels of one category, ascending by order
    pub fn category_view(&self, code: &CategoryCode) -> Vec<&Label> {
        let mut view: Vec<&Label> = self.labels.iter().filter(|l| &l.category == code).collect();
        view.sort_by_key(|l| (l.order, l.id));
        view
    }

    /// Labels grouped for display: configured categories first, in
    /// configuration order, then any ad-hoc codes found on labels.
    pub fn grouped(&self) -> Vec<(Category, Vec<&Label>)> {
        let mut groups: Vec<(Category, Vec<&Label>)> = self
            .config
            .categories
            .iter()
            .map(|c| (c.clone(), self.category_view(&c.code)))
            .collect();

        let mut adhoc: Vec<&CategoryCode> = self
            .labels
            .iter()
            .map(|l| &l.category)
            .filter(|code| self.category(code).is_none())
            .collect();
        adhoc.sort();
        adhoc.dedup();

        for code in adhoc {
            groups.push((
                Category::new(code.clone(), code.as_str()),
                self.category_view(code),
            ));
        }

        groups
    }

    /// Moves a label and returns the changeset to persist. An unknown label
    /// leaves the wall untouched and yields no changes.
    pub fn move_label(&mut self, id: LabelId, target: &MoveTarget) -> Vec<OrderChange> {
        let outcome = reorder::reorder_or_unchanged(&self.labels, id, target);
        if !outcome.is_noop() {
            self.labels = outcome.labels;
        }
        outcome.changes
    }

    /// Renumbers every category gaplessly and returns what changed
    pub fn normalize(&mut self) -> Vec<OrderChange> {
        let outcome = reorder::normalize(&self.labels);
        self.labels = outcome.labels;
        outcome.changes
    }

    /// Applies a changeset, e.g. one replayed from persistence. Changes for
    /// labels no longer on the wall are skipped.
    pub fn apply_changes(&mut self, changes: &[OrderChange]) -> usize {
        let mut applied = 0;
        for change in changes {
            match self.label_mut(change.id) {
                Some(label) => {
                    label.category = change.category.clone();
                    label.order = change.order;
                    applied += 1;
                }
                None => {
                    tracing::debug!(label = %change.id, "Skipping change for missing label");
                }
            }
        }
        applied
    }
}

impl Default for LabelWall {
    fn default() -> Self {
        Self::new(WallConfig::default())
    }
}
