//! # Event subscriber trait.
//!
//! Provides [`Subscribe`], an extension point for plugging custom event
//! handlers (alert surfaces, audit trails, metrics) into the sequencer.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are caught and reported as `EventKind::SubscriberPanicked`)
//!
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_event()
//!                                    └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - A slow subscriber only affects its own queue; it never delays a phase transition.
//! - Queue overflow drops the event **for this subscriber only** and publishes
//!   `EventKind::SubscriberOverflow`.
//! - Events are processed sequentially (FIFO) per subscriber.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use alertvisor::{Subscribe, Event, EventKind};
//!
//! struct Banner;
//!
//! #[async_trait]
//! impl Subscribe for Banner {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::Armed) {
//!             // start the pulsing banner
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "banner" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for alert observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from a dedicated worker task, not in the publisher context.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in logs and overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber (min 1).
    ///
    /// Default: 256.
    fn queue_capacity(&self) -> usize {
        256
    }
}
