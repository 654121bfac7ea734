use std::sync::Arc;

use tokio::task::JoinHandle;

use super::detection::{DetectionResult, EmergencyLogEntry};
use super::log::EmergencyLog;
use crate::core::Sequencer;
use crate::error::DetectionError;
use crate::events::{Event, EventKind};

/// Translates detection results into `trigger` calls and emergency log appends.
///
/// Holds no sequencing state: every report is one `trigger(is_emergency)`,
/// issued before the log append is even started, so a slow or failing log
/// can neither delay nor undo the alert.
pub struct DetectionBridge {
    sequencer: Arc<Sequencer>,
    log: Arc<dyn EmergencyLog>,
}

impl DetectionBridge {
    /// Creates a bridge in front of `sequencer`.
    pub fn new(sequencer: Arc<Sequencer>, log: Arc<dyn EmergencyLog>) -> Self {
        Self { sequencer, log }
    }

    /// The driven sequencer.
    pub fn sequencer(&self) -> &Arc<Sequencer> {
        &self.sequencer
    }

    /// Applies one detection result.
    ///
    /// May be called from any thread; the log append runs on the sequencer's
    /// runtime. Returns the handle of the append when one was started.
    ///
    /// # Errors
    /// [`DetectionError::Confidence`] for malformed input; the sequencer is
    /// left untouched in that case.
    pub fn report(&self, result: &DetectionResult) -> Result<Option<JoinHandle<()>>, DetectionError> {
        result.validate()?;
        self.sequencer.trigger(result.is_emergency);
        if !result.is_emergency {
            return Ok(None);
        }

        let entry = EmergencyLogEntry::from_detection(result);
        tracing::info!(
            emergency_type = %entry.emergency_type,
            confidence = entry.confidence,
            "emergency detected"
        );
        let bus = self.sequencer.bus().clone();
        bus.publish(
            Event::new(EventKind::EmergencyDetected).with_reason(entry.emergency_type.as_str()),
        );

        let log = Arc::clone(&self.log);
        Ok(Some(self.sequencer.runtime().spawn(async move {
            let emergency_type = entry.emergency_type.clone();
            match log.append(entry).await {
                Ok(()) => bus.publish(
                    Event::new(EventKind::EmergencyLogged).with_reason(emergency_type.as_str()),
                ),
                Err(e) => {
                    tracing::warn!(label = e.as_label(), error = %e, "emergency log append failed");
                    bus.publish(
                        Event::new(EventKind::EmergencyLogFailed)
                            .with_reason(e.to_string())
                            .with_label(e.as_label()),
                    );
                }
            }
        })))
    }

    /// Manual dismissal from the alert surface.
    pub fn dismiss(&self) {
        self.sequencer.trigger(false);
    }
}
