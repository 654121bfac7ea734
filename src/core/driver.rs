//! Cycle driver: one task per armed generation.
//!
//! Sleeps until each absolute deadline of the [`Schedule`] and hands the due
//! transitions to [`Inner::apply_due`], which re-checks cancellation and the
//! generation under the state lock. Cancellation wins every race:
//!
//! ```text
//! loop:
//!   select! (biased)
//!     token.cancelled()       → exit
//!     sleep_until(deadline)   → apply_due(generation, due) ── false → exit
//! ```

use std::sync::Arc;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::cadence::Schedule;

use super::sequencer::Inner;

pub(crate) async fn run(
    inner: Arc<Inner>,
    generation: u64,
    mut schedule: Schedule,
    token: CancellationToken,
) {
    while let Some(next) = schedule.peek() {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = time::sleep_until(next.deadline) => {}
        }
        let due = schedule.drain_due(Instant::now());
        if !inner.apply_due(generation, &token, &due) {
            return;
        }
    }
    tracing::debug!(generation, "cadence has no transitions, driver idle");
}
