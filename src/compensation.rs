//! Detection of a body lean masked by an opposite head tilt.

use crate::constants::{DEFAULT_COMPENSATION_RATIO, DEFAULT_MIN_TILT, EPSILON};
use serde::{Deserialize, Serialize};

/// Outcome of the compensation check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompensationStatus {
    /// Head yawed or roll/tilt unavailable, so the check could not run
    Undetermined,
    NotCompensating,
    Compensating { description: String },
}

impl CompensationStatus {
    pub fn is_compensating(&self) -> bool {
        matches!(self, Self::Compensating { .. })
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Compensating { description } => Some(description),
            _ => None,
        }
    }
}

/// Flags correlated, opposite-signed head roll and shoulder tilt deviations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompensationDetector {
    min_tilt: f64,
    ratio_threshold: f64,
}

impl Default for CompensationDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TILT, DEFAULT_COMPENSATION_RATIO)
    }
}

impl CompensationDetector {
    pub fn new(min_tilt: f64, ratio_threshold: f64) -> Self {
        Self { min_tilt, ratio_threshold }
    }

    /// Inspect baseline-adjusted roll and shoulder tilt (degrees)
    pub fn detect(&self, adjusted_roll: Option<f64>, adjusted_shoulder_tilt: Option<f64>) -> CompensationStatus {
        let (Some(roll), Some(tilt)) = (adjusted_roll, adjusted_shoulder_tilt) else {
            return CompensationStatus::Undetermined;
        };

        if roll.abs() <= self.min_tilt && tilt.abs() <= self.min_tilt {
            return CompensationStatus::NotCompensating;
        }
        if roll * tilt >= 0.0 {
            return CompensationStatus::NotCompensating;
        }

        let (small, large) = if roll.abs() < tilt.abs() {
            (roll.abs(), tilt.abs())
        } else {
            (tilt.abs(), roll.abs())
        };
        if large < EPSILON {
            return CompensationStatus::NotCompensating;
        }

        let ratio = small / large;
        if ratio <= self.ratio_threshold {
            return CompensationStatus::NotCompensating;
        }

        let description = if tilt > 0.0 {
            "body leaning right, head compensating left"
        } else {
            "body leaning left, head compensating right"
        };
        log::debug!("Compensation detected: roll {:.1}°, shoulder tilt {:.1}°, ratio {:.2}", roll, tilt, ratio);
        CompensationStatus::Compensating {
            description: description.to_string(),
        }
    }
}
