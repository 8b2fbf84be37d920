//! The user's "good posture" reference snapshot.

use crate::features::Metrics;
use serde::{Deserialize, Serialize};

/// Calibrated reference metrics. Yaw is frame-relative and never baselined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub pitch: f64,
    pub roll: f64,
    pub distance: f64,
    pub shoulder_tilt: f64,
}

impl Baseline {
    /// Build a baseline from one frame's metrics. Pitch and distance are
    /// required; roll and shoulder tilt default to level.
    pub fn from_metrics(metrics: &Metrics) -> Option<Self> {
        Some(Self {
            pitch: metrics.pitch?,
            distance: metrics.distance?,
            roll: metrics.roll.unwrap_or(0.0),
            shoulder_tilt: metrics.shoulder_tilt.unwrap_or(0.0),
        })
    }
}

/// Holds the current baseline for a session; absent until the first calibration
#[derive(Debug, Clone, Default)]
pub struct BaselineStore {
    baseline: Option<Baseline>,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the baseline; returns false and keeps the old one if pitch or
    /// distance is missing
    pub fn calibrate(&mut self, metrics: &Metrics) -> bool {
        match Baseline::from_metrics(metrics) {
            Some(baseline) => {
                log::info!(
                    "Baseline saved: pitch {:.1}°, roll {:.1}°, distance {:.1} cm, shoulder tilt {:.1}°",
                    baseline.pitch,
                    baseline.roll,
                    baseline.distance,
                    baseline.shoulder_tilt
                );
                self.baseline = Some(baseline);
                true
            }
            None => {
                log::warn!("Calibration rejected: pitch or distance unavailable");
                false
            }
        }
    }

    pub fn get(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }
}
