//! Unsynced reorder changes.

use crate::domain::{LabelId, OrderChange};
use std::collections::BTreeMap;
use tokio::time::Instant;

/// Changes waiting for the next flush.
///
/// Keeps only the latest placement per label, so a flush always writes the
/// full final state rather than intermediate drag positions.
#[derive(Debug, Default)]
pub struct PendingChanges {
    changes: BTreeMap<LabelId, OrderChange>,

    /// When the first change since the last flush was recorded.
    first_unsynced_change: Option<Instant>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Merges a changeset; later entries for a label replace earlier ones.
    pub fn record(&mut self, changes: impl IntoIterator<Item = OrderChange>) {
        let now = Instant::now();
        let mut recorded = false;

        for change in changes {
            self.changes.insert(change.id, change);
            recorded = true;
        }

        if recorded && self.first_unsynced_change.is_none() {
            self.first_unsynced_change = Some(now);
        }
    }

    /// Drains everything, resetting the clock.
    pub fn take(&mut self) -> Vec<OrderChange> {
        self.first_unsynced_change = None;
        std::mem::take(&mut self.changes).into_values().collect()
    }

    pub fn ms_since_first_unsynced(&self) -> Option<u64> {
        self.first_unsynced_change
            .map(|t| t.elapsed().as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CategoryCode;

    fn change(id: u32, category: &str, order: u32) -> OrderChange {
        OrderChange {
            id: LabelId::new(id),
            category: CategoryCode::new(category).unwrap(),
            order,
        }
    }

    #[test]
    fn test_new_pending_is_empty() {
        let pending = PendingChanges::new();
        assert!(pending.is_empty());
        assert!(pending.ms_since_first_unsynced().is_none());
    }

    #[test]
    fn test_record_keeps_latest_per_label() {
        let mut pending = PendingChanges::new();
        pending.record(vec![change(1, "todo", 0), change(2, "todo", 1)]);
        pending.record(vec![change(1, "storage", 3)]);

        assert_eq!(pending.len(), 2);

        let drained = pending.take();
        assert_eq!(drained, vec![change(1, "storage", 3), change(2, "todo", 1)]);
        assert!(pending.is_empty());
        assert!(pending.ms_since_first_unsynced().is_none());
    }

    #[test]
    fn test_empty_record_does_not_start_clock() {
        let mut pending = PendingChanges::new();
        pending.record(Vec::new());
        assert!(pending.ms_since_first_unsynced().is_none());
    }
}
