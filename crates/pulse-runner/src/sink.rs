//! Bounded channel adapter for collision events.

use pulse_grid::{CollisionEvent, Delivery, EventSink};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Hands events to a bounded tokio channel without ever waiting.
///
/// A full queue or a departed receiver drops the event and bumps a shared counter.
pub struct ChannelSink {
    tx: mpsc::Sender<CollisionEvent>,
    dropped: Arc<AtomicU64>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<CollisionEvent>) -> Self {
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a sink and the receiving end of its queue
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<CollisionEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Handle for observing the drop count after the sink has moved away
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        self.dropped.clone()
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: CollisionEvent) -> Delivery {
        match self.tx.try_send(event) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Delivery::Dropped
            }
        }
    }
}
