//! Drag reordering of labels within and across categories.
//!
//! Every operation here is a pure function over a snapshot of the wall: the
//! input slice is never mutated, a fresh vector comes back together with the
//! minimal changeset a persistence backend needs to catch up.

use crate::domain::label::{CategoryCode, Label, LabelId};
use crate::error::{Result, ShelfwiseError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where a dragged label lands inside its destination category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    /// Insert in front of the label with this id
    Before(LabelId),
    /// Insert at this zero-based index (clamped)
    Index(usize),
    /// Append after the last label
    End,
}

/// Destination of a drag gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTarget {
    pub category: CategoryCode,
    pub position: DropPosition,
}

impl MoveTarget {
    pub fn new(category: CategoryCode, position: DropPosition) -> Self {
        Self { category, position }
    }

    pub fn end(category: CategoryCode) -> Self {
        Self::new(category, DropPosition::End)
    }

    /// Builds a target from the loose `(anchor, index)` pair a drop handler
    /// reports. An anchor takes precedence; with neither, the label is appended.
    pub fn from_parts(category: CategoryCode, anchor: Option<LabelId>, index: Option<usize>) -> Self {
        let position = match (anchor, index) {
            (Some(anchor), _) => DropPosition::Before(anchor),
            (None, Some(index)) => DropPosition::Index(index),
            (None, None) => DropPosition::End,
        };
        Self::new(category, position)
    }
}

/// The persisted placement of one label after a reorder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChange {
    pub id: LabelId,
    pub category: CategoryCode,
    pub order: u32,
}

/// New wall snapshot plus the labels whose placement changed
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderOutcome {
    pub labels: Vec<Label>,
    pub changes: Vec<OrderChange>,
}

impl ReorderOutcome {
    fn unchanged(labels: &[Label]) -> Self {
        Self {
            labels: labels.to_vec(),
            changes: Vec::new(),
        }
    }

    /// True when nothing moved
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Moves `moved` to `target`, renumbering every category the move touches.
///
/// Fails only with [`ShelfwiseError::LabelNotFound`] when `moved` is not in
/// `labels`. Unknown anchors and out-of-range indices degrade to appending.
///
/// # Examples
/// ```
/// use shelfwise_core::domain::label::{CategoryCode, Label, LabelId};
/// use shelfwise_core::domain::reorder::{reorder, DropPosition, MoveTarget};
///
/// let storage = CategoryCode::new("storage").unwrap();
/// let labels = vec![
///     Label::new(LabelId::new(1), "Attic".to_string(), storage.clone(), 0),
///     Label::new(LabelId::new(2), "Garage".to_string(), storage.clone(), 1),
/// ];
///
/// let target = MoveTarget::new(storage, DropPosition::Index(0));
/// let outcome = reorder(&labels, LabelId::new(2), &target).unwrap();
///
/// assert_eq!(outcome.labels[1].order, 0);
/// assert_eq!(outcome.changes.len(), 2);
/// ```
pub fn reorder(labels: &[Label], moved: LabelId, target: &MoveTarget) -> Result<ReorderOutcome> {
    let moved_idx = labels
        .iter()
        .position(|label| label.id == moved)
        .ok_or(ShelfwiseError::LabelNotFound(moved))?;

    let source = labels[moved_idx].category.clone();
    let mut source_seq = category_sequence(labels, &source);
    let from = source_seq
        .iter()
        .position(|&idx| idx == moved_idx)
        .ok_or(ShelfwiseError::LabelNotFound(moved))?;
    source_seq.remove(from);

    let mut updated = labels.to_vec();
    let mut changes = Vec::new();

    if source == target.category {
        let to = match target.position {
            DropPosition::Before(anchor) if anchor == moved => from,
            position => resolve_index(labels, &source_seq, position),
        };
        source_seq.insert(to, moved_idx);
        renumber(&mut updated, &source_seq, &source, &mut changes);

        tracing::debug!(
            label = %moved,
            category = %source,
            from,
            to,
            changed = changes.len(),
            "Reordered label within category"
        );
    } else {
        renumber(&mut updated, &source_seq, &source, &mut changes);

        let mut dest_seq = category_sequence(labels, &target.category);
        let to = resolve_index(labels, &dest_seq, target.position);
        dest_seq.insert(to, moved_idx);
        renumber(&mut updated, &dest_seq, &target.category, &mut changes);

        tracing::debug!(
            label = %moved,
            from_category = %source,
            to_category = %target.category,
            to,
            changed = changes.len(),
            "Moved label across categories"
        );
    }

    Ok(ReorderOutcome {
        labels: updated,
        changes,
    })
}

/// Like [`reorder`], but an unknown label is logged and treated as a no-op
pub fn reorder_or_unchanged(labels: &[Label], moved: LabelId, target: &MoveTarget) -> ReorderOutcome {
    match reorder(labels, moved, target) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(label = %moved, error = %err, "Ignoring reorder of unknown label");
            ReorderOutcome::unchanged(labels)
        }
    }
}

/// Renumbers every category to a gapless `0..n` sequence, keeping relative order
pub fn normalize(labels: &[Label]) -> ReorderOutcome {
    let mut updated = labels.to_vec();
    let mut changes = Vec::new();

    for category in categories_of(labels) {
        let seq = category_sequence(labels, category);
        renumber(&mut updated, &seq, category, &mut changes);
    }

    ReorderOutcome {
        labels: updated,
        changes,
    }
}

/// Checks that each category's orders are exactly `0..n` with no gaps or duplicates
pub fn check_contiguity(labels: &[Label]) -> bool {
    categories_of(labels).into_iter().all(|category| {
        category_sequence(labels, category)
            .iter()
            .enumerate()
            .all(|(expected, &idx)| labels[idx].order as usize == expected)
    })
}

fn categories_of(labels: &[Label]) -> BTreeSet<&CategoryCode> {
    labels.iter().map(|label| &label.category).collect()
}

/// Indices into `labels` of one category, ascending by order (ties by id)
fn category_sequence(labels: &[Label], category: &CategoryCode) -> Vec<usize> {
    let mut seq: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| &label.category == category)
        .map(|(idx, _)| idx)
        .collect();
    seq.sort_by_key(|&idx| (labels[idx].order, labels[idx].id));
    seq
}

/// Insertion index into `seq` (which excludes the moved label)
fn resolve_index(labels: &[Label], seq: &[usize], position: DropPosition) -> usize {
    match position {
        DropPosition::Before(anchor) => seq
            .iter()
            .position(|&idx| labels[idx].id == anchor)
            .unwrap_or(seq.len()),
        DropPosition::Index(index) => index.min(seq.len()),
        DropPosition::End => seq.len(),
    }
}

fn renumber(
    updated: &mut [Label],
    seq: &[usize],
    category: &CategoryCode,
    changes: &mut Vec<OrderChange>,
) {
    for (order, &idx) in seq.iter().enumerate() {
        let order = order as u32;
        let label = &mut updated[idx];

        if label.order != order || &label.category != category {
            label.category = category.clone();
            label.order = order;
            changes.push(OrderChange {
                id: label.id,
                category: category.clone(),
                order,
            });
        }
    }
}
