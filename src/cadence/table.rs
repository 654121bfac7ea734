//! # Phase table.
//!
//! A [`Cadence`] is a list of [`PhaseSpec`]s positioned at fixed offsets inside
//! one cycle of length [`Cadence::period`]. The sequencer never reads durations
//! directly while running; it consumes the flattened [`Transition`] list.

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

/// Output channel a phase drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Vibration motor.
    Vibration,
    /// Flashlight / camera torch.
    Flash,
}

impl Channel {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Vibration => "vibration",
            Channel::Flash => "flash",
        }
    }
}

/// Identity of a phase within the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Opening vibration burst.
    VibrateA,
    /// Flashlight strobe.
    FlashB,
    /// Closing, longer vibration burst.
    VibrateC,
}

impl PhaseKind {
    /// Stable label used in events and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseKind::VibrateA => "vibrate_a",
            PhaseKind::FlashB => "flash_b",
            PhaseKind::VibrateC => "vibrate_c",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timed segment of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSpec {
    /// Phase identity.
    pub kind: PhaseKind,
    /// Channel driven while the phase is on.
    pub channel: Channel,
    /// Start offset from the cycle anchor.
    pub offset: Duration,
    /// How long the channel stays on.
    pub duration: Duration,
}

impl PhaseSpec {
    /// Offset at which the phase switches its channel off.
    #[inline]
    pub fn end(&self) -> Duration {
        self.offset + self.duration
    }
}

/// Rising or falling edge of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Edge {
    /// Channel switches off. Ordered first so a phase ending and another
    /// starting at the same offset never overlap.
    Off,
    /// Channel switches on.
    On,
}

/// A single edge positioned inside the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Offset from the cycle anchor.
    pub at: Duration,
    /// The phase the edge belongs to.
    pub phase: PhaseSpec,
    /// On or off.
    pub edge: Edge,
}

/// Fixed alert cadence.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use alertvisor::Cadence;
///
/// let cadence = Cadence::standard();
/// assert_eq!(cadence.period(), Duration::from_millis(4500));
/// assert!(cadence.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cadence {
    phases: Vec<PhaseSpec>,
    period: Duration,
}

impl Cadence {
    /// Opening vibration length.
    pub const VIBRATE_A: Duration = Duration::from_millis(1000);
    /// Idle gap between the opening vibration and the flash.
    pub const GAP_AFTER_VIBRATE: Duration = Duration::from_millis(200);
    /// Flash length.
    pub const FLASH_B: Duration = Duration::from_millis(1000);
    /// Idle gap between the flash and the closing vibration.
    pub const GAP_AFTER_FLASH: Duration = Duration::from_millis(500);
    /// Closing vibration length.
    pub const VIBRATE_C: Duration = Duration::from_millis(1500);
    /// Full cycle length; phase A restarts at this offset.
    pub const PERIOD: Duration = Duration::from_millis(4500);

    /// Builds a cadence from an explicit table.
    ///
    /// Phases are sorted by offset. Call [`validate`](Self::validate) before use.
    pub fn new(mut phases: Vec<PhaseSpec>, period: Duration) -> Self {
        phases.sort_by_key(|p| p.offset);
        Self { phases, period }
    }

    /// The reference cadence: A vibrate 1000ms, gap 200ms, B flash 1000ms,
    /// gap 500ms, C vibrate 1500ms, idle until 4500ms, repeat.
    pub fn standard() -> Self {
        let a = PhaseSpec {
            kind: PhaseKind::VibrateA,
            channel: Channel::Vibration,
            offset: Duration::ZERO,
            duration: Self::VIBRATE_A,
        };
        let b = PhaseSpec {
            kind: PhaseKind::FlashB,
            channel: Channel::Flash,
            offset: a.end() + Self::GAP_AFTER_VIBRATE,
            duration: Self::FLASH_B,
        };
        let c = PhaseSpec {
            kind: PhaseKind::VibrateC,
            channel: Channel::Vibration,
            offset: b.end() + Self::GAP_AFTER_FLASH,
            duration: Self::VIBRATE_C,
        };
        Self::new(vec![a, b, c], Self::PERIOD)
    }

    /// Phases ordered by offset.
    pub fn phases(&self) -> &[PhaseSpec] {
        &self.phases
    }

    /// Cycle length.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Checks the table for structural problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.phases.is_empty() {
            return Err(ConfigError::EmptyCadence);
        }
        for p in &self.phases {
            if p.duration.is_zero() {
                return Err(ConfigError::ZeroDuration {
                    phase: p.kind.as_str(),
                });
            }
            if p.end() > self.period {
                return Err(ConfigError::PhaseOutsidePeriod {
                    phase: p.kind.as_str(),
                    end: p.end(),
                    period: self.period,
                });
            }
        }
        for (i, first) in self.phases.iter().enumerate() {
            for second in &self.phases[i + 1..] {
                if first.channel == second.channel && second.offset < first.end() {
                    return Err(ConfigError::OverlappingPhases {
                        first: first.kind.as_str(),
                        second: second.kind.as_str(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Flattens the table into edges sorted by offset (off before on at ties).
    pub fn transitions(&self) -> Vec<Transition> {
        let mut out: Vec<Transition> = self
            .phases
            .iter()
            .flat_map(|&phase| {
                [
                    Transition {
                        at: phase.offset,
                        phase,
                        edge: Edge::On,
                    },
                    Transition {
                        at: phase.end(),
                        phase,
                        edge: Edge::Off,
                    },
                ]
            })
            .collect();
        out.sort_by_key(|t| (t.at, t.edge));
        out
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::standard()
    }
}
