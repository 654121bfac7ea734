//! # Example: degraded_torch
//!
//! Runs the alert with camera permission denied, then simulates the user
//! enabling it in the OS settings and tapping "Enable Flashlight".
//!
//! Shows how to:
//! - Observe [`EventKind::FlashlightAdvisory`] and [`EventKind::CapabilityUnavailable`].
//! - Keep vibrating while the flash phase runs as an idle gap.
//! - Recover with [`Sequencer::retry_flashlight_permission`].
//!
//! ## Run
//! ```bash
//! ALERTVISOR_LOG=debug cargo run --example degraded_torch
//! ```

use std::{sync::Arc, time::Duration};

use alertvisor::actuators::recording::{RecordingHaptics, RecordingTorch};
use alertvisor::{
    Config, Event, EventKind, Permission, PulseTrainVibrator, SequencerBuilder, Subscribe, Torch,
};
use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

/// Stand-in for the alert surface: reacts to degradation events only.
struct AdvisoryBanner;

#[async_trait]
impl Subscribe for AdvisoryBanner {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::FlashlightAdvisory => {
                println!(
                    "[banner] show \"Enable Flashlight\" ({})",
                    ev.reason.as_deref().unwrap_or("-")
                );
            }
            EventKind::CapabilityUnavailable => {
                println!(
                    "[banner] flash phase idle: {}",
                    ev.label.unwrap_or("capability_unavailable")
                );
            }
            EventKind::PermissionResolved => {
                println!("[banner] camera permission: {}", ev.reason.as_deref().unwrap_or("-"));
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "advisory-banner"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("ALERTVISOR_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let device = Arc::new(RecordingTorch::new().with_permission(Permission::Denied));
    let haptics = Arc::new(PulseTrainVibrator::new(RecordingHaptics::new()));

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(AdvisoryBanner)];
    let sequencer = SequencerBuilder::new(Config::default())
        .with_vibrator(haptics.clone())
        .with_torch(Torch::from_arc(device.clone()))
        .with_subscribers(subs)
        .build();

    sequencer.trigger(true);
    tokio::time::sleep(Duration::from_millis(4500)).await;
    let s = sequencer.snapshot();
    println!(
        "after one cycle: taps={} advisory={} camera={}",
        haptics.engine().taps().len(),
        s.flashlight_advisory,
        s.camera.as_str()
    );

    // The user flips the OS setting and taps the banner.
    device.set_permission_answer(Permission::Granted);
    let permission = sequencer.retry_flashlight_permission().await?;
    println!("retry -> {}", permission.as_str());

    tokio::time::sleep(Duration::from_millis(1300)).await;
    println!("flashing during next phase B: {}", sequencer.snapshot().flashing);

    sequencer.dispose();
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
