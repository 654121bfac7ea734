//! # Detection event bridge.
//!
//! Thin adapter between the detection pipeline and the sequencer:
//!
//! ```text
//! DetectionResult ──► DetectionBridge::report()
//!                        ├─► Sequencer::trigger(is_emergency)      (first, always)
//!                        └─► spawn EmergencyLog::append(entry)     (emergency only)
//!                               ├─ Ok  → EmergencyLogged
//!                               └─ Err → EmergencyLogFailed (alert unaffected)
//! ```

#[allow(clippy::module_inception)]
mod bridge;
mod detection;
mod keywords;
mod log;

pub use bridge::DetectionBridge;
pub use detection::{DetectionResult, EmergencyLogEntry};
pub use keywords::{DEFAULT_KEYWORDS, DetectionSimulator, KeywordMatcher};
pub use log::{EmergencyLog, InMemoryEmergencyLog};
