//! User settings
//!
//! The step goal is owned by the host application. The engine only reads it,
//! through [`SettingsProvider`], at the moment each sample is merged.

use serde::{Deserialize, Serialize};

use crate::error::PedestrianError;
use crate::types::DistanceUnit;

/// Default daily step goal
pub const DEFAULT_DAILY_STEP_GOAL: u32 = 10_000;

/// Source of the daily step goal
pub trait SettingsProvider {
    fn daily_step_goal(&self) -> u32;
}

impl SettingsProvider for u32 {
    fn daily_step_goal(&self) -> u32 {
        *self
    }
}

/// User-configurable settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub daily_step_goal: u32,
    pub distance_unit: DistanceUnit,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_step_goal: DEFAULT_DAILY_STEP_GOAL,
            distance_unit: DistanceUnit::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), PedestrianError> {
        if self.daily_step_goal == 0 {
            return Err(PedestrianError::InvalidGoal(self.daily_step_goal));
        }
        Ok(())
    }

    /// Load and validate settings from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, PedestrianError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, PedestrianError> {
        serde_json::to_string_pretty(self).map_err(|e| PedestrianError::EncodingError(e.to_string()))
    }
}

impl SettingsProvider for Settings {
    fn daily_step_goal(&self) -> u32 {
        self.daily_step_goal
    }
}
