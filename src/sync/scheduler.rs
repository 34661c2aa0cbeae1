//! Optimistic reorders with a debounced write-behind to storage.
//!
//! The wall is updated locally on every drag event; the resulting changesets
//! are handed to a [`SyncScheduler`], which waits for the gesture to settle
//! before writing them out in one batch.

use crate::{
    domain::{LabelWall, OrderChange},
    error::Result,
    storage::Storage,
    sync::{PendingChanges, SyncConfig},
};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use uuid::Uuid;

/// Outcome of one flush, reported to whoever owns the receiver.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Flushed {
        batch: Uuid,
        count: usize,
    },
    /// The batch was dropped. Local state is now ahead of storage and
    /// should be replaced via [`SyncScheduler::resync`].
    Failed {
        batch: Uuid,
        error: String,
        discarded: Vec<OrderChange>,
    },
}

struct Shared<S> {
    storage: Arc<S>,
    config: SyncConfig,
    pending: Mutex<PendingChanges>,
    /// Held for the whole of a flush so batches reach storage in order.
    flush_lock: Mutex<()>,
    events: mpsc::UnboundedSender<SyncEvent>,
}

impl<S: Storage> Shared<S> {
    async fn flush(&self) -> Result<usize> {
        let _guard = self.flush_lock.lock().await;

        let changes = self.pending.lock().await.take();
        if changes.is_empty() {
            return Ok(0);
        }

        let batch = Uuid::new_v4();
        let count = changes.len();

        match self.storage.apply_changes(&changes).await {
            Ok(()) => {
                tracing::info!(%batch, count, "Synced label order");
                let _ = self.events.send(SyncEvent::Flushed { batch, count });
                Ok(count)
            }
            Err(err) => {
                tracing::error!(%batch, count, error = %err, "Label order sync failed, discarding batch");
                let _ = self.events.send(SyncEvent::Failed {
                    batch,
                    error: err.to_string(),
                    discarded: changes,
                });
                Err(err)
            }
        }
    }
}

/// Batches reorder changesets and writes them after a quiet period.
///
/// Must be used from within a tokio runtime; timers are spawned tasks.
pub struct SyncScheduler<S: Storage + 'static> {
    shared: Arc<Shared<S>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl<S: Storage + 'static> SyncScheduler<S> {
    /// Creates a scheduler and the receiving end of its event stream.
    pub fn new(storage: Arc<S>, config: SyncConfig) -> Result<(Self, mpsc::UnboundedReceiver<SyncEvent>)> {
        config.validate()?;

        let (events, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            shared: Arc::new(Shared {
                storage,
                config,
                pending: Mutex::new(PendingChanges::new()),
                flush_lock: Mutex::new(()),
                events,
            }),
            timer: Mutex::new(None),
        };

        Ok((scheduler, rx))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.shared.config
    }

    /// Number of labels with an unsynced placement.
    pub async fn pending_len(&self) -> usize {
        self.shared.pending.lock().await.len()
    }

    /// Queues a changeset and (re)arms the flush timer.
    ///
    /// With sync disabled the changeset is written before this returns.
    pub async fn schedule(&self, changes: Vec<OrderChange>) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let delay = {
            let mut pending = self.shared.pending.lock().await;
            pending.record(changes);
            self.shared
                .config
                .next_delay(pending.ms_since_first_unsynced().unwrap_or(0))
        };

        if !self.shared.config.enabled {
            self.shared.flush().await?;
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detach the write so re-arming can only ever cancel the wait.
            tokio::spawn(async move {
                let _ = shared.flush().await;
            });
        });

        if let Some(previous) = self.timer.lock().await.replace(handle) {
            previous.abort();
        }
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Armed label sync timer");

        Ok(())
    }

    /// Writes pending changes now, skipping the remaining quiet period.
    pub async fn flush_now(&self) -> Result<usize> {
        self.disarm().await;
        self.shared.flush().await
    }

    /// Drops the timer and every unsynced change. Returns how many were dropped.
    pub async fn cancel(&self) -> usize {
        self.disarm().await;
        let dropped = self.shared.pending.lock().await.take().len();
        if dropped > 0 {
            tracing::debug!(dropped, "Discarded unsynced label changes");
        }
        dropped
    }

    /// Abandons local optimistic state and reloads the authoritative wall.
    ///
    /// Waits for any flush already writing to storage, so the reload never
    /// observes a half-applied batch.
    pub async fn resync(&self) -> Result<LabelWall> {
        let _guard = self.shared.flush_lock.lock().await;
        self.cancel().await;
        let wall = self.shared.storage.load_wall().await?;
        tracing::info!(labels = wall.labels.len(), "Reloaded label wall from storage");
        Ok(wall)
    }

    async fn disarm(&self) {
        if let Some(handle) = self.timer.lock().await.take() {
            handle.abort();
        }
    }
}

impl<S: Storage + 'static> Drop for SyncScheduler<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().take() {
            handle.abort();
        }
    }
}
