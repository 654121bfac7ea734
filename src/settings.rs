//! # Alert-enablement settings.
//!
//! [`AlertSettings`] is the read-only snapshot of the user's profile flags the
//! sequencer honors. It is injected when the sequencer is built and replaced
//! through [`Sequencer::update_settings`](crate::Sequencer::update_settings);
//! the crate keeps no global copy.
//!
//! The field names follow the profile record (`enable_flashlight`,
//! `enable_vibration`, `sensitivity_level`) so the struct can be deserialized
//! straight from a profile store payload.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Detection sensitivity, 1 (least) to 5 (most).
///
/// # Example
/// ```
/// use alertvisor::SensitivityLevel;
///
/// assert_eq!(SensitivityLevel::new(4).unwrap().get(), 4);
/// assert!(SensitivityLevel::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SensitivityLevel(u8);

impl SensitivityLevel {
    /// Lowest accepted level.
    pub const MIN: u8 = 1;
    /// Highest accepted level.
    pub const MAX: u8 = 5;

    /// Validates and wraps a level.
    pub fn new(level: u8) -> Result<Self, ConfigError> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ConfigError::Sensitivity(level))
        }
    }

    /// Raw level.
    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for SensitivityLevel {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for SensitivityLevel {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<SensitivityLevel> for u8 {
    fn from(level: SensitivityLevel) -> u8 {
        level.0
    }
}

/// Alert channel flags read from the user profile.
///
/// - `enable_flashlight = false` skips the flash phase entirely (no torch command,
///   no permission prompt).
/// - `enable_vibration = false` skips both vibration phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Strobe the torch during the flash phase.
    pub enable_flashlight: bool,
    /// Drive the vibration motor during vibration phases.
    pub enable_vibration: bool,
    /// Detection sensitivity (consumed by the detection side, carried here
    /// because it arrives in the same profile snapshot).
    pub sensitivity_level: SensitivityLevel,
}

impl AlertSettings {
    /// Both output channels enabled.
    pub fn all_enabled() -> Self {
        Self::default()
    }

    /// Returns a copy with the flashlight flag replaced.
    #[must_use]
    pub fn with_flashlight(mut self, enabled: bool) -> Self {
        self.enable_flashlight = enabled;
        self
    }

    /// Returns a copy with the vibration flag replaced.
    #[must_use]
    pub fn with_vibration(mut self, enabled: bool) -> Self {
        self.enable_vibration = enabled;
        self
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enable_flashlight: true,
            enable_vibration: true,
            sensitivity_level: SensitivityLevel::default(),
        }
    }
}
