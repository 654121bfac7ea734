//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], which distributes events to multiple subscribers
//! concurrently without blocking the publisher.
//!
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Isolation**: slow/panicking subscriber doesn't affect others
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//!
//! `AssertUnwindSafe` is used around `on_event`; a subscriber that panics while
//! holding its own lock may leave that state poisoned.

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Queue feeding one subscriber worker.
struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for alert event subscribers.
///
/// Owned by the sequencer's listener task; it is drained and joined when the
/// sequencer is disposed.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (lanes, workers) = subs
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let lane = Lane { name: sub.name(), tx };
                (lane, tokio::spawn(deliver(sub, rx, bus.clone())))
            })
            .unzip();
        Self {
            lanes,
            workers,
            bus,
        }
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Whether no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Emits an event to all subscribers (clones the event once).
    pub fn emit(&self, event: &Event) {
        if self.lanes.is_empty() {
            return;
        }
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a pre-allocated `Arc<Event>` to all subscribers.
    ///
    /// A dropped `SubscriberOverflow` is not reported again.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let report = event.kind != EventKind::SubscriberOverflow;
        for lane in &self.lanes {
            let Err(err) = lane.tx.try_send(Arc::clone(&event)) else {
                continue;
            };
            let reason = match err {
                mpsc::error::TrySendError::Full(_) => "full",
                mpsc::error::TrySendError::Closed(_) => "closed",
            };
            if report {
                tracing::warn!(subscriber = lane.name, reason, kind = ?event.kind, "subscriber dropped event");
                self.bus.publish(Event::subscriber_overflow(lane.name, reason));
            }
        }
    }

    /// Closes every queue and waits until the workers have handled what was
    /// already queued.
    pub async fn shutdown(self) {
        let Self { lanes, workers, .. } = self;
        drop(lanes);
        for (i, worker) in workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                tracing::error!(worker = i, error = %e, "subscriber worker aborted");
            }
        }
    }
}

/// Worker loop for one subscriber. Panics are contained and reported on the bus.
async fn deliver(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let outcome = std::panic::AssertUnwindSafe(sub.on_event(ev.as_ref()))
            .catch_unwind()
            .await;
        if let Err(payload) = outcome {
            let info = panic_message(payload.as_ref());
            tracing::error!(subscriber = sub.name(), kind = ?ev.kind, %info, "subscriber panicked");
            bus.publish(Event::subscriber_panicked(sub.name(), info));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&'static str>()
        .map(|m| (*m).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
