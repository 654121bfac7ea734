//! Alert state owned by the sequencer and the snapshot it publishes.
//!
//! [`AlertState`] lives behind one mutex inside the sequencer. Every mutation
//! (arm, disarm, phase edge, torch result) happens under that lock and ends
//! with a fresh [`AlertSnapshot`] pushed through a `watch` channel.

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::actuators::Permission;
use crate::cadence::PhaseKind;
use crate::settings::AlertSettings;

/// Read-only view of the alert for rendering.
///
/// Invariant: `active == false` implies `vibrating == false && flashing == false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertSnapshot {
    /// An emergency cycle is armed.
    pub active: bool,
    /// The vibration motor is engaged.
    pub vibrating: bool,
    /// The torch is (believed to be) lit.
    pub flashing: bool,
    /// Anchor of the armed chain; every deadline is computed from it.
    pub cycle_started_at: Option<Instant>,
    /// Zero-based cycle number of the armed chain.
    pub cycle: u64,
    /// Phase currently in progress, `None` during gaps and while idle.
    pub phase: Option<PhaseKind>,
    /// Cached camera permission.
    pub camera: Permission,
    /// The UI should offer an "Enable Flashlight" affordance.
    pub flashlight_advisory: bool,
}

impl AlertSnapshot {
    /// Snapshot of a freshly built, idle sequencer.
    pub const IDLE: AlertSnapshot = AlertSnapshot {
        active: false,
        vibrating: false,
        flashing: false,
        cycle_started_at: None,
        cycle: 0,
        phase: None,
        camera: Permission::Unknown,
        flashlight_advisory: false,
    };
}

impl Default for AlertSnapshot {
    fn default() -> Self {
        Self::IDLE
    }
}

/// Handle of the armed cycle driver.
pub(crate) struct LiveCycle {
    pub(crate) token: CancellationToken,
    pub(crate) handle: JoinHandle<()>,
}

impl LiveCycle {
    /// Cancels the driver. It never applies another transition afterwards.
    pub(crate) fn cancel(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

pub(crate) struct AlertState {
    pub(crate) active: bool,
    pub(crate) vibrating: bool,
    pub(crate) flashing: bool,
    pub(crate) cycle_started_at: Option<Instant>,
    pub(crate) camera: Permission,

    /// Bumped on every arm; transitions carry the generation they were scheduled for.
    pub(crate) generation: u64,
    pub(crate) cycle: u64,
    pub(crate) phase: Option<PhaseKind>,

    /// Bumped on every flash phase so a late torch failure only reverts its own phase.
    pub(crate) flash_epoch: u64,
    /// An On was sent for the current flash phase; the matching Off must follow.
    pub(crate) flash_engaged: bool,

    pub(crate) advisory: bool,
    pub(crate) advisory_raised_in: Option<u64>,

    pub(crate) disposed: bool,
    pub(crate) settings: AlertSettings,
    pub(crate) live: Option<LiveCycle>,
}

impl AlertState {
    pub(crate) fn new(settings: AlertSettings) -> Self {
        Self {
            active: false,
            vibrating: false,
            flashing: false,
            cycle_started_at: None,
            camera: Permission::Unknown,
            generation: 0,
            cycle: 0,
            phase: None,
            flash_epoch: 0,
            flash_engaged: false,
            advisory: false,
            advisory_raised_in: None,
            disposed: false,
            settings,
            live: None,
        }
    }

    /// Clears the phase flags and detaches the live driver.
    pub(crate) fn go_idle(&mut self) -> Option<LiveCycle> {
        self.active = false;
        self.vibrating = false;
        self.flashing = false;
        self.flash_engaged = false;
        self.phase = None;
        self.cycle_started_at = None;
        self.live.take()
    }

    pub(crate) fn snapshot(&self) -> AlertSnapshot {
        AlertSnapshot {
            active: self.active,
            vibrating: self.vibrating,
            flashing: self.flashing,
            cycle_started_at: self.cycle_started_at,
            cycle: self.cycle,
            phase: self.phase,
            camera: self.camera,
            flashlight_advisory: self.advisory && self.settings.enable_flashlight,
        }
    }
}
