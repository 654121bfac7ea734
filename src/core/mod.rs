//! Runtime core: arming, the cycle clock and actuator orchestration.
//!
//! The public API from this module is [`Sequencer`] (built with
//! [`SequencerBuilder`]), its [`Config`] and the [`AlertSnapshot`] it publishes.
//!
//! Internal modules:
//! - [`sequencer`]: state transitions under one lock, arm/disarm/dispose;
//! - [`driver`]: one task per armed generation, sleeps until absolute deadlines;
//! - [`flash`]: torch worker that executes commands in FIFO order;
//! - [`state`]: alert state and the published snapshot;
//! - [`builder`]: wires bus, subscribers, actuators and workers.

mod builder;
mod config;
mod driver;
mod flash;
mod sequencer;
mod state;

pub use builder::SequencerBuilder;
pub use config::Config;
pub use sequencer::Sequencer;
pub use state::AlertSnapshot;
