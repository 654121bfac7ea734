//! Hardware actuator adapters.
//!
//! Thin capability wrappers the sequencer drives. Nothing outside the
//! sequencer should call them directly; one sequencer owns one set.
//!
//! ## Contents
//! - [`Vibrator`] the motor interface used by the sequencer, with two
//!   implementations selected at composition time:
//!   - [`SustainedVibrator`] over a [`PatternMotor`] (the platform holds a pattern)
//!   - [`PulseTrainVibrator`] over a [`HapticEngine`] (the platform only taps)
//! - [`Torch`] permission-gated flashlight over a [`TorchDevice`]
//! - [`recording`] host-side backends that record every command
//!
//! ## Wiring
//! ```text
//! Sequencer ──► Arc<dyn Vibrator> ──► SustainedVibrator ──► PatternMotor
//!           │                     └─► PulseTrainVibrator ─► HapticEngine (taps)
//!           └─► torch worker ──► Torch ──► TorchDevice
//! ```

pub mod recording;

mod torch;
mod vibrator;

pub use torch::{Permission, Torch, TorchDevice};
pub use vibrator::{HapticEngine, PatternMotor, PulseTrainVibrator, SustainedVibrator, Vibrator};
