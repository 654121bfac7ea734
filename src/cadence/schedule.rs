//! # Cycle clock.
//!
//! [`Schedule`] turns a [`Cadence`] plus one anchor instant (`cycleStartedAt`)
//! into an endless sequence of absolute deadlines:
//!
//! ```text
//! deadline(cycle, t) = anchor + period × cycle + t.at
//! ```
//!
//! The driver sleeps until each deadline in turn. A late wake-up delays only
//! that one transition; the next deadline is still computed from the anchor.

use std::time::Duration;

use tokio::time::Instant;

use super::table::{Cadence, Transition};

/// A transition bound to an absolute deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    /// When the transition is due.
    pub deadline: Instant,
    /// Zero-based cycle number.
    pub cycle: u64,
    /// The edge to apply.
    pub transition: Transition,
}

/// Endless iterator of scheduled transitions for one armed cycle chain.
#[derive(Debug, Clone)]
pub struct Schedule {
    anchor: Instant,
    period: Duration,
    transitions: Vec<Transition>,
    cycle: u64,
    index: usize,
}

impl Schedule {
    /// Creates a schedule anchored at `anchor`.
    pub fn new(anchor: Instant, cadence: &Cadence) -> Self {
        Self {
            anchor,
            period: cadence.period(),
            transitions: cadence.transitions(),
            cycle: 0,
            index: 0,
        }
    }

    /// The anchor (`cycleStartedAt`).
    pub fn anchor(&self) -> Instant {
        self.anchor
    }

    /// Start instant of the given cycle.
    pub fn cycle_start(&self, cycle: u64) -> Instant {
        let n = u32::try_from(cycle).unwrap_or(u32::MAX);
        self.anchor + self.period.saturating_mul(n)
    }

    /// Returns the next transition without consuming it.
    pub fn peek(&self) -> Option<Scheduled> {
        let transition = *self.transitions.get(self.index)?;
        Some(Scheduled {
            deadline: self.cycle_start(self.cycle) + transition.at,
            cycle: self.cycle,
            transition,
        })
    }

    /// Pops every transition already due at `now`.
    pub fn drain_due(&mut self, now: Instant) -> Vec<Scheduled> {
        let mut due = Vec::new();
        while let Some(next) = self.peek() {
            if next.deadline > now {
                break;
            }
            due.push(next);
            self.advance();
        }
        due
    }

    fn advance(&mut self) {
        self.index += 1;
        if self.index >= self.transitions.len() {
            self.index = 0;
            self.cycle += 1;
        }
    }
}

impl Iterator for Schedule {
    type Item = Scheduled;

    fn next(&mut self) -> Option<Scheduled> {
        let next = self.peek()?;
        self.advance();
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cadence::{Edge, PhaseKind};

    #[tokio::test(start_paused = true)]
    async fn deadlines_are_absolute_across_cycles() {
        let anchor = Instant::now();
        let cadence = Cadence::standard();
        let schedule = Schedule::new(anchor, &cadence);

        let offsets: Vec<(u64, u128)> = schedule
            .take(13)
            .map(|s| (s.cycle, (s.deadline - anchor).as_millis()))
            .collect();
        assert_eq!(
            offsets,
            vec![
                (0, 0),
                (0, 1000),
                (0, 1200),
                (0, 2200),
                (0, 2700),
                (0, 4200),
                (1, 4500),
                (1, 5500),
                (1, 5700),
                (1, 6700),
                (1, 7200),
                (1, 8700),
                (2, 9000),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn drain_due_pops_only_elapsed_transitions() {
        let anchor = Instant::now();
        let mut schedule = Schedule::new(anchor, &Cadence::standard());

        let due = schedule.drain_due(anchor);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].transition.phase.kind, PhaseKind::VibrateA);
        assert_eq!(due[0].transition.edge, Edge::On);

        let next = schedule.peek().unwrap();
        assert_eq!(next.deadline - anchor, Duration::from_millis(1000));
        assert_eq!(next.transition.edge, Edge::Off);

        let due = schedule.drain_due(anchor + Duration::from_millis(2300));
        assert_eq!(due.len(), 3);
        assert_eq!(schedule.peek().unwrap().transition.phase.kind, PhaseKind::VibrateC);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_cadence_yields_nothing() {
        let cadence = Cadence::new(vec![], Duration::from_millis(100));
        let mut schedule = Schedule::new(Instant::now(), &cadence);
        assert!(schedule.next().is_none());
        assert!(schedule.drain_due(Instant::now()).is_empty());
    }
}
