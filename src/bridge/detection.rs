//! Detection input and the emergency log record derived from it.

use serde::{Deserialize, Serialize};

use crate::error::DetectionError;

/// Output of the (external) transcription and keyword detection service.
///
/// Field names follow the service's JSON (`isEmergency`, `detectedKeyword`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// Transcribed speech.
    pub transcription: String,
    /// Whether an emergency keyword was heard.
    pub is_emergency: bool,
    /// Detector confidence in `0..=1`.
    pub confidence: f64,
    /// The keyword that matched, if any.
    #[serde(default)]
    pub detected_keyword: Option<String>,
}

impl DetectionResult {
    /// An emergency detection.
    pub fn emergency(
        transcription: impl Into<String>,
        keyword: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            transcription: transcription.into(),
            is_emergency: true,
            confidence,
            detected_keyword: Some(keyword.into()),
        }
    }

    /// Ordinary speech.
    pub fn normal(transcription: impl Into<String>, confidence: f64) -> Self {
        Self {
            transcription: transcription.into(),
            is_emergency: false,
            confidence,
            detected_keyword: None,
        }
    }

    /// Rejects confidences that are not finite or outside `0..=1`.
    pub fn validate(&self) -> Result<(), DetectionError> {
        if self.confidence.is_finite() && (0.0..=1.0).contains(&self.confidence) {
            Ok(())
        } else {
            Err(DetectionError::Confidence(self.confidence))
        }
    }
}

/// Record appended to the emergency log when a detection fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyLogEntry {
    /// The detected keyword, or `"emergency"` when none was reported.
    pub emergency_type: String,
    /// Transcribed speech.
    pub transcription: String,
    /// Detector confidence.
    pub confidence: f64,
}

impl EmergencyLogEntry {
    /// Type used when the detector reported no keyword.
    pub const DEFAULT_TYPE: &'static str = "emergency";

    /// Builds the log record for `result`.
    pub fn from_detection(result: &DetectionResult) -> Self {
        let emergency_type = result
            .detected_keyword
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or(Self::DEFAULT_TYPE)
            .to_string();
        Self {
            emergency_type,
            transcription: result.transcription.clone(),
            confidence: result.confidence,
        }
    }
}
