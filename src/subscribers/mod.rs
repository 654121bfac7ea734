//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`].
//!
//! ```text
//! Sequencer / Bridge ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                 │
//!                                                   ┌─────────────┼──────────┐
//!                                                   ▼             ▼          ▼
//!                                               LogWriter   alert surface  custom
//! ```
//!
//! The alert surface (pulsing banner, status dots) usually needs only the
//! latest state; prefer [`Sequencer::subscribe`](crate::Sequencer::subscribe)
//! for that and use subscribers for per-event reactions.

mod log;
mod subscriber;
mod subscriber_set;

pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
