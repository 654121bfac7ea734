//! # alertvisor
//!
//! **Alertvisor** drives a multi-channel emergency alert: a repeating,
//! cancellable cadence of vibration bursts and flashlight strobes, armed and
//! disarmed by a boolean emergency signal.
//!
//! It is built for users who cannot rely on hearing an alarm. The detection
//! side (speech-to-text, keyword spotting) is external; this crate owns the
//! state machine that reacts to its output.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   DetectionResult ──► DetectionBridge ──┬──► EmergencyLog::append (spawned)
//!                                         ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Sequencer                                                        │
//! │  - AlertState (one mutex, generation counter)                     │
//! │  - Schedule (absolute deadlines from cycleStartedAt)              │
//! │  - watch::Sender<AlertSnapshot> (alert surface re-renders)        │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────────────┬────────────────────────────┬────┘
//!        ▼                          ▼                            │
//! ┌──────────────┐          ┌───────────────┐                    │
//! │ cycle driver │          │ torch worker  │                    │
//! │ (1 per arm)  │          │ (FIFO mpsc)   │                    │
//! └──────┬───────┘          └──────┬────────┘                    │
//!        ▼                         ▼                             │
//!  Arc<dyn Vibrator>             Torch ──► TorchDevice           │
//!   ├─ SustainedVibrator                                         │
//!   └─ PulseTrainVibrator                                        ▼
//!                                                   Bus ──► SubscriberSet
//!                                                     ┌─────────┼─────────┐
//!                                                     ▼         ▼         ▼
//!                                                 LogWriter   sub 2     sub N
//! ```
//!
//! ### Lifecycle
//! ```text
//! trigger(true)
//!   ├─► cancel previous chain (token), motor cancel, torch Off
//!   ├─► generation += 1, anchor = now
//!   ├─► phase A on (synchronously)
//!   └─► driver: for each deadline
//!         ├─ sleep_until(anchor + period * cycle + offset) (cancellable)
//!         ├─ lock, re-check token + generation
//!         ├─ apply edge: vibrate / flash / skip (disabled, unavailable)
//!         └─ publish snapshot + events
//!
//! trigger(false) / stop()   ─► cancel chain, every actuator off, active = false
//! dispose() / Drop          ─► stop + release vibrator and torch handles
//!                               + flush and join subscriber workers
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                               |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------------|
//! | **Sequencer**     | Arm/disarm the cadence, observe state.                        | [`Sequencer`], [`SequencerBuilder`], [`AlertSnapshot`] |
//! | **Cadence**       | Phase table and drift-free cycle clock.                       | [`Cadence`], [`Schedule`]                        |
//! | **Actuators**     | Vibration and flashlight capability wrappers.                 | [`Vibrator`], [`Torch`], [`TorchDevice`]         |
//! | **Bridge**        | Detection results to `trigger` plus emergency log.            | [`DetectionBridge`], [`EmergencyLog`]            |
//! | **Subscriber API**| Hook into alert events (logging, UI, audit).                  | [`Subscribe`], [`LogWriter`]                     |
//! | **Errors**        | Typed degradations with stable labels.                        | [`CapabilityError`], [`AlertError`]              |
//! | **Configuration** | Runtime knobs and user settings.                              | [`Config`], [`AlertSettings`]                    |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use alertvisor::{AlertSettings, Config, SequencerBuilder, SustainedVibrator, Torch};
//! use alertvisor::actuators::recording::{RecordingMotor, RecordingTorch};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sequencer = SequencerBuilder::new(Config::default())
//!         .with_vibrator(Arc::new(SustainedVibrator::new(RecordingMotor::new())))
//!         .with_torch(Torch::new(RecordingTorch::new()))
//!         .with_settings(AlertSettings::all_enabled())
//!         .build();
//!
//!     let mut state = sequencer.subscribe();
//!     sequencer.trigger(true);
//!     assert!(state.borrow_and_update().vibrating);
//!
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     sequencer.stop();
//!     assert!(!sequencer.snapshot().active);
//! }
//! ```
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod actuators;
mod bridge;
mod cadence;
mod core;
mod error;
mod events;
mod settings;
mod subscribers;

// ---- Public re-exports ----

pub use actuators::{
    HapticEngine, PatternMotor, Permission, PulseTrainVibrator, SustainedVibrator, Torch,
    TorchDevice, Vibrator,
};
pub use bridge::{
    DEFAULT_KEYWORDS, DetectionBridge, DetectionResult, DetectionSimulator, EmergencyLog,
    EmergencyLogEntry, InMemoryEmergencyLog, KeywordMatcher,
};
pub use cadence::{Cadence, Channel, Edge, PhaseKind, PhaseSpec, Schedule, Scheduled, Transition};
pub use crate::core::{AlertSnapshot, Config, Sequencer, SequencerBuilder};
pub use error::{
    ActuatorError, AlertError, CapabilityError, ConfigError, DetectionError, LogError,
};
pub use events::{Bus, Event, EventKind};
pub use settings::{AlertSettings, SensitivityLevel};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
