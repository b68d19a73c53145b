//! In-process pub/sub bus channels.
//!
//! `CanHub` owns a broadcast channel of frame batches. Cloning the hub or
//! handing out `CanPublisher`/`CanSubscriber` handles is cheap; every
//! subscriber sees every batch published after it subscribed, which matches
//! the shared-medium nature of a CAN bus.

use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::error::{BusError, BusResult};
use crate::types::{Batch, CanFrame};

/// Default number of batches retained per lagging subscriber.
pub const DEFAULT_CAPACITY: usize = 64;

// ── CanHub ──────────────────────────────────────────────────────

/// One shared bus. Everything published reaches every live subscriber.
#[derive(Clone)]
pub struct CanHub {
    tx: broadcast::Sender<Batch>,
}

impl CanHub {
    /// Create a hub retaining up to `capacity` batches for slow subscribers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all batches published from this point on.
    pub fn subscribe(&self) -> CanSubscriber {
        CanSubscriber {
            rx: self.tx.subscribe(),
        }
    }

    /// Handle for publishing batches onto the bus.
    pub fn publisher(&self) -> CanPublisher {
        CanPublisher {
            tx: self.tx.clone(),
        }
    }
}

impl Default for CanHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ── CanPublisher ────────────────────────────────────────────────

/// Publishing handle. Sends are fire-and-forget: a bus with no listeners
/// silently drops traffic, same as real hardware.
#[derive(Clone)]
pub struct CanPublisher {
    tx: broadcast::Sender<Batch>,
}

impl CanPublisher {
    /// Publish one batch of frames.
    pub fn send_batch(&self, batch: Batch) {
        let _ = self.tx.send(batch);
    }

    /// Publish a single frame as its own batch.
    pub fn send_frame(&self, frame: CanFrame) {
        self.send_batch(vec![frame]);
    }
}

// ── CanSubscriber ───────────────────────────────────────────────

/// Receiving handle with drain-or-wait semantics.
pub struct CanSubscriber {
    rx: broadcast::Receiver<Batch>,
}

impl CanSubscriber {
    /// Receive the next batch, waiting until one is available.
    ///
    /// A subscriber that fell behind the hub's retention window skips to
    /// the oldest retained batch and keeps going; losing broadcast frames
    /// is recoverable, losing the whole channel is not.
    pub async fn recv_batch(&mut self) -> BusResult<Batch> {
        loop {
            match self.rx.recv().await {
                Ok(batch) => return Ok(batch),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "bus subscriber lagged, resuming from oldest");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return Err(BusError::Closed),
            }
        }
    }

    /// Receive the next batch or give up at `deadline`.
    ///
    /// Returns `Ok(None)` once the deadline passes with nothing available.
    pub async fn recv_batch_deadline(&mut self, deadline: Instant) -> BusResult<Option<Batch>> {
        match tokio::time::timeout_at(deadline, self.recv_batch()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }
}
