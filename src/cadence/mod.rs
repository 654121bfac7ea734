//! Alert cadence: the phase table and the cycle clock that schedules it.
//!
//! ## Contents
//! - [`Cadence`], [`PhaseSpec`], [`PhaseKind`], [`Channel`] the fixed phase table
//! - [`Transition`], [`Edge`] the table flattened into on/off edges
//! - [`Schedule`] absolute deadlines derived from one anchor instant
//!
//! ## Standard cadence
//! ```text
//!   0ms        1000 1200      2200   2700           4200  4500
//!   ├─ A vib ──┤    ├─ B flash ┤      ├──── C vib ───┤     ├─ A (next cycle)
//! ```
//!
//! Deadlines are always `anchor + period * cycle + offset`; nothing is
//! accumulated from previous sleeps, so the cadence does not drift.

mod schedule;
mod table;

pub use schedule::{Schedule, Scheduled};
pub use table::{Cadence, Channel, Edge, PhaseKind, PhaseSpec, Transition};
