//! Jitter smoothing for per-frame posture metrics.
//!
//! Each metric keeps its own bounded history and is reduced to a median, so a
//! single-frame detection glitch cannot move the smoothed value on its own.

/// Median filter for outlier rejection
pub mod median;

use median::MedianWindow;
use serde::{Deserialize, Serialize};

/// Median of each metric's recent history
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SmoothedMetrics {
    pub pitch: Option<f64>,
    pub roll: Option<f64>,
    pub shoulder_tilt: Option<f64>,
    pub distance: Option<f64>,
}

/// Per-metric median smoothing filter
#[derive(Debug, Clone)]
pub struct SmoothingFilter {
    pitch: MedianWindow,
    roll: MedianWindow,
    shoulder_tilt: MedianWindow,
    distance: MedianWindow,
}

impl SmoothingFilter {
    /// Create a new smoothing filter
    ///
    /// # Panics
    ///
    /// Panics if `window_size` is zero
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        Self {
            pitch: MedianWindow::new(window_size),
            roll: MedianWindow::new(window_size),
            shoulder_tilt: MedianWindow::new(window_size),
            distance: MedianWindow::new(window_size),
        }
    }

    /// Record one frame; missing metrics leave their history untouched
    pub fn add_sample(
        &mut self,
        pitch: Option<f64>,
        roll: Option<f64>,
        shoulder_tilt: Option<f64>,
        distance: Option<f64>,
    ) {
        let channels = [
            (&mut self.pitch, pitch),
            (&mut self.roll, roll),
            (&mut self.shoulder_tilt, shoulder_tilt),
            (&mut self.distance, distance),
        ];
        for (window, value) in channels {
            if let Some(value) = value {
                window.push(value);
            }
        }
    }

    pub fn smoothed_values(&self) -> SmoothedMetrics {
        SmoothedMetrics {
            pitch: self.pitch.median(),
            roll: self.roll.median(),
            shoulder_tilt: self.shoulder_tilt.median(),
            distance: self.distance.median(),
        }
    }

    /// True once pitch or distance holds at least half a window of samples
    pub fn is_ready(&self) -> bool {
        let min_required = (self.pitch.window_size() / 2).max(1);
        self.pitch.len() >= min_required || self.distance.len() >= min_required
    }

    /// Clear all histories
    pub fn reset(&mut self) {
        self.pitch.clear();
        self.roll.clear();
        self.shoulder_tilt.clear();
        self.distance.clear();
    }

    pub fn window_size(&self) -> usize {
        self.pitch.window_size()
    }
}
