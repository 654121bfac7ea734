//! # Example: emergency_cycle
//!
//! Arms the alert, lets two cycles run and prints every state change the
//! alert surface would render.
//!
//! Shows how to:
//! - Compose a [`Sequencer`] with a vibrator and a torch.
//! - Watch [`AlertSnapshot`]s through [`Sequencer::subscribe`].
//! - Attach the built-in [`LogWriter`].
//!
//! ## Flow
//! ```text
//! trigger(true) ──► A vibrate ──► gap ──► B flash ──► gap ──► C vibrate ──► idle ──► repeat
//!                                                                   └─► trigger(false) after 2 cycles
//! ```
//!
//! ## Run
//! ```bash
//! ALERTVISOR_LOG=debug cargo run --example emergency_cycle
//! ```

use std::{sync::Arc, time::Duration};

use alertvisor::actuators::recording::{RecordingMotor, RecordingTorch};
use alertvisor::{
    AlertSettings, AlertSnapshot, Cadence, Config, LogWriter, SequencerBuilder, Subscribe,
    SustainedVibrator, Torch,
};
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

fn render(s: &AlertSnapshot, start: Instant) -> String {
    let dot = |on: bool| if on { "●" } else { "○" };
    format!(
        "{:>5}ms  active={} vibrate={} flash={} cycle={} phase={}",
        start.elapsed().as_millis(),
        dot(s.active),
        dot(s.vibrating),
        dot(s.flashing),
        s.cycle,
        s.phase.map(|p| p.as_str()).unwrap_or("-"),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("ALERTVISOR_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let sequencer = SequencerBuilder::new(Config::default())
        .with_vibrator(Arc::new(SustainedVibrator::new(RecordingMotor::new())))
        .with_torch(Torch::new(RecordingTorch::new()))
        .with_settings(AlertSettings::all_enabled())
        .with_subscribers(subs)
        .build();

    let mut rx = sequencer.subscribe();
    let start = Instant::now();
    sequencer.trigger(true);
    println!("{}", render(&rx.borrow_and_update(), start));

    let run_for = Cadence::PERIOD * 2;
    let deadline = tokio::time::sleep(run_for);
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = rx.changed() => {
                changed?;
                println!("{}", render(&rx.borrow_and_update(), start));
            }
        }
    }

    sequencer.trigger(false);
    println!("{}", render(&sequencer.snapshot(), start));
    sequencer.dispose();

    // Give the subscriber workers a moment to flush.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
