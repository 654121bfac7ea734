//! # LogWriter: events to `tracing`
//!
//! A subscriber that renders incoming [`Event`]s as structured `tracing`
//! records under the `alertvisor::events` target. Install any
//! `tracing-subscriber` to see them.
//!
//! ## Levels
//! - `info`: armed, disarmed, disposed, emergency detected, advisory
//! - `debug`: cycle and phase boundaries, permission decisions, log appends
//! - `warn`: degradations (actuator failures, unavailable capabilities, skipped
//!   flash phases, log failures, subscriber overflow)
//! - `error`: scheduling conflicts and subscriber panics

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let phase = e.phase.map(|p| p.as_str());
        let channel = e.channel.map(|c| c.as_str());
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::Armed => {
                tracing::info!(target: "alertvisor::events", generation = ?e.generation, "armed");
            }
            EventKind::Disarmed => {
                tracing::info!(target: "alertvisor::events", generation = ?e.generation, "disarmed");
            }
            EventKind::Disposed => {
                tracing::info!(target: "alertvisor::events", "disposed");
            }
            EventKind::CycleStarted => {
                tracing::debug!(target: "alertvisor::events", generation = ?e.generation, cycle = ?e.cycle, "cycle started");
            }
            EventKind::PhaseStarted => {
                tracing::debug!(target: "alertvisor::events", ?phase, ?channel, cycle = ?e.cycle, "phase started");
            }
            EventKind::PhaseEnded => {
                tracing::debug!(target: "alertvisor::events", ?phase, ?channel, cycle = ?e.cycle, "phase ended");
            }
            EventKind::PhaseSkipped => {
                tracing::warn!(target: "alertvisor::events", ?phase, ?channel, ?reason, "phase skipped");
            }
            EventKind::ActuatorFailed => {
                tracing::warn!(target: "alertvisor::events", ?channel, ?reason, label = ?e.label, "actuator failed");
            }
            EventKind::CapabilityUnavailable => {
                tracing::warn!(target: "alertvisor::events", ?channel, ?reason, label = ?e.label, "capability unavailable");
            }
            EventKind::FlashlightAdvisory => {
                tracing::info!(target: "alertvisor::events", ?reason, "enable flashlight advisory");
            }
            EventKind::PermissionResolved => {
                tracing::debug!(target: "alertvisor::events", permission = ?reason, "camera permission");
            }
            EventKind::SchedulingConflict => {
                tracing::error!(target: "alertvisor::events", generation = ?e.generation, "scheduling conflict");
            }
            EventKind::TriggerRejected => {
                tracing::warn!(target: "alertvisor::events", label = ?e.label, "trigger rejected");
            }
            EventKind::EmergencyDetected => {
                tracing::info!(target: "alertvisor::events", keyword = ?reason, "emergency detected");
            }
            EventKind::EmergencyLogged => {
                tracing::debug!(target: "alertvisor::events", emergency_type = ?reason, "emergency logged");
            }
            EventKind::EmergencyLogFailed => {
                tracing::warn!(target: "alertvisor::events", ?reason, label = ?e.label, "emergency log failed");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "alertvisor::events", ?reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "alertvisor::events", ?reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
