//! # Events emitted by the sequencer, the torch worker and the detection bridge.
//!
//! [`EventKind`] groups events into:
//! - **Arming**: armed, disarmed, disposed
//! - **Cadence**: cycle and phase boundaries, skipped phases
//! - **Degradation**: actuator failures, unavailable capabilities, the flashlight advisory
//! - **Detection**: emergency detected / logged / log failed
//! - **Subscriber**: overflow and panic reports from the fan-out workers
//!
//! [`Event`] carries optional metadata (phase, channel, cycle, generation,
//! reason, label) filled in according to the kind.
//!
//! ## Ordering guarantees
//! Each event has a process-wide `seq` that increases monotonically.
//!
//! ## Example
//! ```rust
//! use alertvisor::{Event, EventKind, PhaseKind};
//!
//! let ev = Event::new(EventKind::PhaseStarted)
//!     .with_phase(PhaseKind::FlashB)
//!     .with_cycle(2);
//!
//! assert_eq!(ev.kind, EventKind::PhaseStarted);
//! assert_eq!(ev.phase, Some(PhaseKind::FlashB));
//! assert_eq!(ev.cycle, Some(2));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::cadence::{Channel, PhaseKind};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of alert events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Arming ===
    /// A cycle chain was armed (fresh or restarted).
    ///
    /// Sets: `generation`
    Armed,

    /// The active cycle chain was cancelled and all actuators switched off.
    ///
    /// Sets: `generation`
    Disarmed,

    /// The sequencer released its hardware handles.
    Disposed,

    // === Cadence ===
    /// A new cycle began (phase A about to start).
    ///
    /// Sets: `generation`, `cycle`
    CycleStarted,

    /// A phase switched its channel on.
    ///
    /// Sets: `generation`, `cycle`, `phase`, `channel`
    PhaseStarted,

    /// A phase switched its channel off.
    ///
    /// Sets: `generation`, `cycle`, `phase`, `channel`
    PhaseEnded,

    /// A phase ran as an idle gap (channel disabled or unavailable).
    ///
    /// Sets: `generation`, `cycle`, `phase`, `channel`, `reason`
    PhaseSkipped,

    // === Degradation ===
    /// An actuator command failed; the phase continues cosmetically.
    ///
    /// Sets: `channel`, `reason`, `label`
    ActuatorFailed,

    /// A capability cannot be used (no hardware, permission denied, released).
    ///
    /// Sets: `channel`, `reason`, `label`
    CapabilityUnavailable,

    /// The UI should offer an "Enable Flashlight" affordance.
    ///
    /// Sets: `reason`
    FlashlightAdvisory,

    /// Camera permission was resolved.
    ///
    /// Sets: `reason` (`granted` / `denied` / `unknown`)
    PermissionResolved,

    /// A transition arrived for an armed generation that was not active.
    ///
    /// Sets: `generation`, `label`
    SchedulingConflict,

    /// `trigger(true)` was refused.
    ///
    /// Sets: `label`
    TriggerRejected,

    // === Detection ===
    /// The bridge received an emergency detection.
    ///
    /// Sets: `reason` (keyword)
    EmergencyDetected,

    /// The emergency log accepted the entry.
    ///
    /// Sets: `reason` (emergency type)
    EmergencyLogged,

    /// The emergency log rejected the entry; the alert is unaffected.
    ///
    /// Sets: `reason`, `label`
    EmergencyLogFailed,

    // === Subscriber ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason`
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason`
    SubscriberPanicked,
}

/// Alert event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Arm generation the event belongs to.
    pub generation: Option<u64>,
    /// Zero-based cycle number inside the generation.
    pub cycle: Option<u64>,
    /// Phase the event refers to.
    pub phase: Option<PhaseKind>,
    /// Output channel the event refers to.
    pub channel: Option<Channel>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Stable error label (from `as_label`).
    pub label: Option<&'static str>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            generation: None,
            cycle: None,
            phase: None,
            channel: None,
            reason: None,
            label: None,
        }
    }

    /// Attaches the arm generation.
    #[inline]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Attaches the cycle number.
    #[inline]
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    /// Attaches a phase.
    #[inline]
    pub fn with_phase(mut self, phase: PhaseKind) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches an output channel.
    #[inline]
    pub fn with_channel(mut self, channel: Channel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a stable error label.
    #[inline]
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::Armed);
        let b = Event::new(EventKind::Disarmed);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_fill_metadata() {
        let ev = Event::new(EventKind::CapabilityUnavailable)
            .with_channel(Channel::Flash)
            .with_reason("no torch hardware available")
            .with_label("capability_no_hardware")
            .with_generation(7);
        assert_eq!(ev.channel, Some(Channel::Flash));
        assert_eq!(ev.reason.as_deref(), Some("no torch hardware available"));
        assert_eq!(ev.label, Some("capability_no_hardware"));
        assert_eq!(ev.generation, Some(7));
        assert_eq!(ev.cycle, None);
    }

    #[test]
    fn subscriber_reports_name_the_subscriber() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.reason.as_deref(), Some("subscriber=audit reason=full"));
    }
}
