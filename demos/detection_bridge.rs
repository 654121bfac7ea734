//! # Example: detection_bridge
//!
//! Feeds simulated detection results through a [`DetectionBridge`]:
//! emergencies arm the alert and land in the emergency log, ordinary speech
//! disarms it.
//!
//! ## Flow
//! ```text
//! DetectionSimulator ──► DetectionBridge::report()
//!                           ├─► Sequencer::trigger(is_emergency)
//!                           └─► InMemoryEmergencyLog::append()   (emergency only)
//! ```
//!
//! ## Run
//! ```bash
//! ALERTVISOR_LOG=info cargo run --example detection_bridge
//! ```

use std::{sync::Arc, time::Duration};

use alertvisor::actuators::recording::{RecordingMotor, RecordingTorch};
use alertvisor::{
    Config, DetectionBridge, DetectionResult, DetectionSimulator, EmergencyLog,
    InMemoryEmergencyLog, KeywordMatcher, LogWriter, SequencerBuilder, Subscribe,
    SustainedVibrator, Torch,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("ALERTVISOR_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let sequencer = SequencerBuilder::new(Config::default())
        .with_vibrator(Arc::new(SustainedVibrator::new(RecordingMotor::new())))
        .with_torch(Torch::new(RecordingTorch::new()))
        .with_subscribers(subs)
        .build();

    let log = Arc::new(InMemoryEmergencyLog::new());
    let bridge = DetectionBridge::new(sequencer, log.clone());
    let simulator = DetectionSimulator::new(KeywordMatcher::new(["fire", "evacuate", "danger"]));

    // A payload as the transcription service would send it.
    let payload = r#"{"transcription":"Attention all personnel, this is not a drill. Evacuate now.","isEmergency":true,"confidence":0.93,"detectedKeyword":"evacuate"}"#;
    let from_service: DetectionResult = serde_json::from_str(payload)?;

    let script = [
        from_service,
        simulator.normal(),
        simulator.emergency(),
        simulator.emergency(),
        simulator.normal(),
    ];
    for result in &script {
        println!(
            "> {:?} (emergency={}, confidence={:.2})",
            result.transcription, result.is_emergency, result.confidence
        );
        bridge.report(result)?;
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let s = bridge.sequencer().snapshot();
        println!("  active={} vibrating={} flashing={}", s.active, s.vibrating, s.flashing);
    }

    bridge.dismiss();
    println!("\nemergency log (newest first):");
    for entry in log.recent().await? {
        println!("  {}", serde_json::to_string(&entry)?);
    }

    bridge.sequencer().dispose();
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
