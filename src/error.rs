//! Error types used by the alert sequencer, its adapters and the detection bridge.
//!
//! - [`CapabilityError`]: a hardware capability (torch) cannot be used right now.
//! - [`ActuatorError`]: a command to a vibration motor or torch failed at the OS level.
//! - [`AlertError`]: errors raised by the sequencer itself.
//! - [`ConfigError`]: invalid cadence or settings.
//! - [`DetectionError`]: malformed detection input.
//! - [`LogError`]: the emergency log collaborator rejected an append.
//!
//! Every enum exposes `as_label` (stable snake_case string for logs and events).
//! None of these are fatal to a running cycle: capability and actuator failures
//! degrade the affected phase, everything else is reported and absorbed.

use std::time::Duration;
use thiserror::Error;

/// # A capability is not usable.
///
/// Returned by [`Torch::set_on`](crate::Torch::set_on). The sequencer treats
/// every variant as a recoverable degradation of the flash phase.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// Camera permission was denied by the user or the OS.
    #[error("camera permission denied")]
    PermissionDenied,

    /// The device has no torch (e.g. no camera flash).
    #[error("no torch hardware available")]
    NoHardware,

    /// The capability handle was already relinquished by `dispose()`.
    #[error("capability handle released")]
    Released,

    /// The underlying actuator command failed.
    #[error("torch command failed: {0}")]
    Command(#[from] ActuatorError),
}

impl CapabilityError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use alertvisor::CapabilityError;
    ///
    /// assert_eq!(CapabilityError::PermissionDenied.as_label(), "capability_permission_denied");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CapabilityError::PermissionDenied => "capability_permission_denied",
            CapabilityError::NoHardware => "capability_no_hardware",
            CapabilityError::Released => "capability_released",
            CapabilityError::Command(_) => "capability_command_failed",
        }
    }

    /// Whether the capability is unavailable for the rest of the process
    /// (until the user acts), as opposed to a one-off command failure.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, CapabilityError::Command(_))
    }
}

/// # An actuator command failed.
///
/// Transient, OS-level failures toggling the vibration motor or the torch.
/// The phase continues as if the command had succeeded; retrying mid-phase
/// would desynchronize the cadence.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActuatorError {
    /// The platform refused or failed the command.
    #[error("{actuator} command failed: {reason}")]
    Command {
        /// Actuator name (e.g. "vibrator", "torch").
        actuator: &'static str,
        /// Platform-provided failure description.
        reason: String,
    },

    /// The actuator was released and no longer accepts commands.
    #[error("actuator released")]
    Released,
}

impl ActuatorError {
    /// Shorthand for [`ActuatorError::Command`].
    pub fn command(actuator: &'static str, reason: impl Into<String>) -> Self {
        ActuatorError::Command {
            actuator,
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            ActuatorError::Command { .. } => "actuator_command_failed",
            ActuatorError::Released => "actuator_released",
        }
    }
}

/// # Errors produced by the sequencer.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlertError {
    /// A phase transition reached an armed generation that is no longer active.
    ///
    /// Structurally impossible with cancel-before-arm ordering; if observed the
    /// sequencer resets to idle.
    #[error("scheduling conflict in generation {generation}")]
    SchedulingConflict {
        /// Generation of the cycle that produced the stray transition.
        generation: u64,
    },

    /// The sequencer was disposed and no longer arms.
    #[error("sequencer disposed")]
    Disposed,

    /// Capability degradation (see [`CapabilityError`]).
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// Actuator command failure (see [`ActuatorError`]).
    #[error(transparent)]
    Actuator(#[from] ActuatorError),
}

impl AlertError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use alertvisor::AlertError;
    ///
    /// assert_eq!(AlertError::Disposed.as_label(), "alert_disposed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AlertError::SchedulingConflict { .. } => "alert_scheduling_conflict",
            AlertError::Disposed => "alert_disposed",
            AlertError::Capability(e) => e.as_label(),
            AlertError::Actuator(e) => e.as_label(),
        }
    }
}

/// # Invalid cadence or settings.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The cadence has no phases.
    #[error("cadence has no phases")]
    EmptyCadence,

    /// A phase has zero duration.
    #[error("phase {phase} has zero duration")]
    ZeroDuration {
        /// Phase label.
        phase: &'static str,
    },

    /// A phase ends after the cycle period.
    #[error("phase {phase} ends at {end:?}, after the cycle period {period:?}")]
    PhaseOutsidePeriod {
        /// Phase label.
        phase: &'static str,
        /// Phase end offset.
        end: Duration,
        /// Cycle period.
        period: Duration,
    },

    /// Two phases drive the same channel at the same time.
    #[error("phases {first} and {second} overlap on the same channel")]
    OverlappingPhases {
        /// Earlier phase label.
        first: &'static str,
        /// Later phase label.
        second: &'static str,
    },

    /// Sensitivity outside 1..=5.
    #[error("sensitivity level {0} outside 1..=5")]
    Sensitivity(u8),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::EmptyCadence => "config_empty_cadence",
            ConfigError::ZeroDuration { .. } => "config_zero_duration",
            ConfigError::PhaseOutsidePeriod { .. } => "config_phase_outside_period",
            ConfigError::OverlappingPhases { .. } => "config_overlapping_phases",
            ConfigError::Sensitivity(_) => "config_sensitivity",
        }
    }
}

/// # Malformed detection input.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// Confidence is not a finite number in `0..=1`.
    #[error("confidence {0} outside 0..=1")]
    Confidence(f64),
}

/// # Emergency log append failures.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// The persistence backend is unreachable.
    #[error("emergency log unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the entry.
    #[error("emergency log rejected entry: {0}")]
    Rejected(String),
}

impl LogError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            LogError::Unavailable(_) => "log_unavailable",
            LogError::Rejected(_) => "log_rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_command_is_not_unavailability() {
        let err: CapabilityError = ActuatorError::command("torch", "busy").into();
        assert!(!err.is_unavailable());
        assert_eq!(err.as_label(), "capability_command_failed");
        assert!(CapabilityError::NoHardware.is_unavailable());
        assert!(CapabilityError::PermissionDenied.is_unavailable());
    }

    #[test]
    fn alert_error_forwards_inner_labels() {
        let err = AlertError::from(CapabilityError::NoHardware);
        assert_eq!(err.as_label(), "capability_no_hardware");
        assert_eq!(err.to_string(), "no torch hardware available");

        let err = AlertError::from(ActuatorError::Released);
        assert_eq!(err.as_label(), "actuator_released");
    }

    #[test]
    fn actuator_error_message_names_the_actuator() {
        let err = ActuatorError::command("vibrator", "motor busy");
        assert_eq!(err.to_string(), "vibrator command failed: motor busy");
    }
}
