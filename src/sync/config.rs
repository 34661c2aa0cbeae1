//! Debounced sync configuration.

use crate::error::{Result, ShelfwiseError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controls how reorder changesets are batched before reaching storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// When disabled, every scheduled changeset is written immediately.
    pub enabled: bool,

    /// Quiescence window in milliseconds.
    ///
    /// A flush happens once no new reorder arrived for this long.
    /// Additional reorders restart the window.
    pub debounce_ms: u64,

    /// Upper bound on how long a pending change may wait.
    ///
    /// A continuous drag that keeps restarting the window is still flushed
    /// this many milliseconds after its first unsynced change.
    pub max_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 500,
            max_delay_ms: 5_000,
        }
    }
}

impl SyncConfig {
    /// A config that writes through on every reorder.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms == 0 {
            return Err(ShelfwiseError::ConfigError(
                "debounce_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_delay_ms < self.debounce_ms {
            return Err(ShelfwiseError::ConfigError(format!(
                "max_delay_ms ({}) must not be shorter than debounce_ms ({})",
                self.max_delay_ms, self.debounce_ms
            )));
        }
        Ok(())
    }

    /// How long to wait before the next flush check.
    pub(crate) fn next_delay(&self, since_first_unsynced_ms: u64) -> Duration {
        let remaining_max = self.max_delay_ms.saturating_sub(since_first_unsynced_ms);
        Duration::from_millis(self.debounce_ms.min(remaining_max))
    }
}
