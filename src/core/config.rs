//! # Sequencer runtime configuration.
//!
//! Provides [`Config`], the knobs that are fixed for the lifetime of a
//! [`Sequencer`](crate::Sequencer). User-facing flags live in
//! [`AlertSettings`](crate::AlertSettings) instead, because they change at runtime.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1

use crate::cadence::Cadence;

/// Runtime configuration for the alert sequencer.
///
/// ## Field semantics
/// - `cadence`: phase table driven while armed (validated at build time)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `advisory_once`: raise the "enable flashlight" advisory only once per process
#[derive(Clone, Debug)]
pub struct Config {
    /// Phase table.
    ///
    /// An invalid table is replaced by [`Cadence::standard`] with an error log.
    pub cadence: Cadence,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Whether the flashlight advisory is raised at most once.
    ///
    /// When `false` it is raised on every arm that finds the torch unusable.
    pub advisory_once: bool,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `cadence = Cadence::standard()` (4500ms cycle)
    /// - `bus_capacity = 256`
    /// - `advisory_once = true`
    fn default() -> Self {
        Self {
            cadence: Cadence::standard(),
            bus_capacity: 256,
            advisory_once: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_capacity_is_clamped_to_one() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert!(cfg.advisory_once);
        assert_eq!(cfg.cadence, Cadence::standard());
    }
}
