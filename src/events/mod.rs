//! Alert events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Sequencer`, the cycle driver, the torch worker,
//!   `DetectionBridge`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener spawned by `SequencerBuilder::build`
//!   (fans out to `SubscriberSet`), plus anyone holding `Sequencer::bus()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
