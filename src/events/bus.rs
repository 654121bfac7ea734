//! # Event bus for broadcasting alert events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from the sequencer, its cycle driver, the
//! torch worker and the detection bridge.
//!
//! ```text
//! Publishers:                        Receivers:
//!   Sequencer ────┐
//!   cycle driver ─┼──► Bus ──► subscriber listener ──► SubscriberSet
//!   torch worker ─┤      └───► bus.subscribe() (tests, UI glue)
//!   Bridge ───────┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks and never fails.
//! - **Bounded capacity**: slow receivers get `RecvError::Lagged(n)` and skip `n` events.
//! - **No persistence**: events are lost if nobody is subscribed.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for alert events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_see_events_published_after_subscribe() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::Armed));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::Disarmed));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::Disarmed);
    }
}
