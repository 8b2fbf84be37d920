//! Per-frame raw verdict from smoothed metrics, baseline and thresholds.

use crate::{
    baseline::Baseline,
    compensation::{CompensationDetector, CompensationStatus},
    constants::DEFAULT_YAW_THRESHOLD,
    debouncer::PostureState,
    filters::SmoothedMetrics,
    thresholds::{Metric, ThresholdSet},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A specific postural fault, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureIssue {
    HeadPitch,
    Distance,
    HeadRoll,
    ShoulderTilt,
    BodyCompensation,
}

impl PostureIssue {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeadPitch => "head_pitch",
            Self::Distance => "distance",
            Self::HeadRoll => "head_roll",
            Self::ShoulderTilt => "shoulder_tilt",
            Self::BodyCompensation => "body_compensation",
        }
    }

    /// Human readable phrase used in warning messages
    pub fn phrase(self) -> &'static str {
        match self {
            Self::HeadPitch => "head tilted down",
            Self::Distance => "too close to the screen",
            Self::HeadRoll => "head tilted sideways",
            Self::ShoulderTilt => "shoulders uneven",
            Self::BodyCompensation => "body leaning with head compensating",
        }
    }
}

impl fmt::Display for PostureIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Smoothed metrics relative to the baseline
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustedMetrics {
    pub pitch: Option<f64>,
    pub roll: Option<f64>,
    pub shoulder_tilt: Option<f64>,
    /// `baseline - current`, positive when closer than calibrated
    pub distance_deviation: Option<f64>,
}

impl AdjustedMetrics {
    pub fn relative_to(smoothed: &SmoothedMetrics, baseline: &Baseline) -> Self {
        Self {
            pitch: smoothed.pitch.map(|p| p - baseline.pitch),
            roll: smoothed.roll.map(|r| r - baseline.roll),
            shoulder_tilt: smoothed.shoulder_tilt.map(|t| t - baseline.shoulder_tilt),
            distance_deviation: smoothed.distance.map(|d| baseline.distance - d),
        }
    }
}

/// Raw (not yet debounced) classification of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub is_bad: bool,
    pub issues: Vec<PostureIssue>,
    pub adjusted: AdjustedMetrics,
    pub compensation: CompensationStatus,
    pub head_facing_forward: bool,
}

/// Evaluates hysteresis thresholds and the compensation pattern
#[derive(Debug, Clone, Copy)]
pub struct PostureClassifier {
    yaw_threshold: f64,
    compensation: CompensationDetector,
}

impl Default for PostureClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_YAW_THRESHOLD, CompensationDetector::default())
    }
}

impl PostureClassifier {
    pub fn new(yaw_threshold: f64, compensation: CompensationDetector) -> Self {
        Self { yaw_threshold, compensation }
    }

    /// Classify one frame against `state`, the debounced state of the previous
    /// frame. Missing metrics are skipped rather than treated as good or bad.
    /// An unknown yaw counts as not facing forward.
    pub fn classify(
        &self,
        smoothed: &SmoothedMetrics,
        yaw: Option<f64>,
        baseline: &Baseline,
        thresholds: &ThresholdSet,
        state: PostureState,
    ) -> Verdict {
        let adjusted = AdjustedMetrics::relative_to(smoothed, baseline);
        let mut issues = Vec::new();

        if adjusted.pitch.is_some_and(|p| thresholds.violates(Metric::Pitch, p, state)) {
            issues.push(PostureIssue::HeadPitch);
        }
        if adjusted
            .distance_deviation
            .is_some_and(|d| thresholds.violates(Metric::Distance, d, state))
        {
            issues.push(PostureIssue::Distance);
        }

        let head_facing_forward = yaw.is_some_and(|y| y.abs() < self.yaw_threshold);
        let compensation = if head_facing_forward {
            self.compensation.detect(adjusted.roll, adjusted.shoulder_tilt)
        } else {
            CompensationStatus::Undetermined
        };

        if compensation.is_compensating() {
            issues.push(PostureIssue::BodyCompensation);
        } else if head_facing_forward {
            if adjusted.roll.is_some_and(|r| thresholds.violates(Metric::HeadRoll, r, state)) {
                issues.push(PostureIssue::HeadRoll);
            }
            if adjusted
                .shoulder_tilt
                .is_some_and(|t| thresholds.violates(Metric::ShoulderTilt, t, state))
            {
                issues.push(PostureIssue::ShoulderTilt);
            }
        }

        Verdict {
            is_bad: !issues.is_empty(),
            issues,
            adjusted,
            compensation,
            head_facing_forward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> Baseline {
        Baseline {
            pitch: 0.0,
            roll: 0.0,
            distance: 50.0,
            shoulder_tilt: 0.0,
        }
    }

    fn smoothed(pitch: f64, roll: f64, shoulder_tilt: f64, distance: f64) -> SmoothedMetrics {
        SmoothedMetrics {
            pitch: Some(pitch),
            roll: Some(roll),
            shoulder_tilt: Some(shoulder_tilt),
            distance: Some(distance),
        }
    }

    fn classify(metrics: &SmoothedMetrics, baseline: &Baseline, state: PostureState) -> Verdict {
        PostureClassifier::default().classify(metrics, Some(0.0), baseline, &ThresholdSet::default(), state)
    }

    #[test]
    fn test_good_posture() {
        let verdict = classify(&smoothed(0.0, 0.0, 0.0, 50.0), &baseline(), PostureState::Good);
        assert!(!verdict.is_bad);
        assert!(verdict.issues.is_empty());
        assert_eq!(verdict.compensation, CompensationStatus::NotCompensating);
    }

    #[test]
    fn test_head_pitch_issue() {
        let verdict = classify(&smoothed(-15.0, 0.0, 0.0, 50.0), &baseline(), PostureState::Good);
        assert_eq!(verdict.issues, vec![PostureIssue::HeadPitch]);
    }

    #[test]
    fn test_distance_issue() {
        let base = Baseline { distance: 55.0, ..baseline() };
        let verdict = classify(&smoothed(0.0, 0.0, 0.0, 40.0), &base, PostureState::Good);
        assert_eq!(verdict.issues, vec![PostureIssue::Distance]);
        assert_eq!(verdict.adjusted.distance_deviation, Some(15.0));
    }

    #[test]
    fn test_head_roll_issue() {
        let verdict = classify(&smoothed(0.0, 20.0, 0.0, 50.0), &baseline(), PostureState::Good);
        assert!(verdict.is_bad);
        assert_eq!(verdict.issues, vec![PostureIssue::HeadRoll]);
    }

    #[test]
    fn test_shoulder_tilt_issue() {
        let verdict = classify(&smoothed(0.0, 0.0, 15.0, 50.0), &baseline(), PostureState::Good);
        assert_eq!(verdict.issues, vec![PostureIssue::ShoulderTilt]);
    }

    #[test]
    fn test_multiple_issues_in_order() {
        let base = Baseline { distance: 55.0, ..baseline() };
        let verdict = classify(&smoothed(-15.0, 20.0, 15.0, 40.0), &base, PostureState::Good);
        assert_eq!(
            verdict.issues,
            vec![
                PostureIssue::HeadPitch,
                PostureIssue::Distance,
                PostureIssue::HeadRoll,
                PostureIssue::ShoulderTilt
            ]
        );
    }

    #[test]
    fn test_compensation_suppresses_roll_and_tilt() {
        let verdict = classify(&smoothed(0.0, 8.0, -6.0, 50.0), &baseline(), PostureState::Good);
        assert_eq!(verdict.issues, vec![PostureIssue::BodyCompensation]);
        assert!(verdict.compensation.is_compensating());
    }

    #[test]
    fn test_hysteresis_uses_previous_state() {
        let metrics = smoothed(-9.0, 0.0, 0.0, 50.0);
        assert!(!classify(&metrics, &baseline(), PostureState::Good).is_bad);
        assert!(classify(&metrics, &baseline(), PostureState::Bad).is_bad);
    }

    #[test]
    fn test_yawed_head_skips_roll_and_tilt() {
        let verdict = PostureClassifier::default().classify(
            &smoothed(0.0, 20.0, 15.0, 50.0),
            Some(45.0),
            &baseline(),
            &ThresholdSet::default(),
            PostureState::Good,
        );
        assert!(!verdict.is_bad);
        assert!(!verdict.head_facing_forward);
        assert_eq!(verdict.compensation, CompensationStatus::Undetermined);
    }

    #[test]
    fn test_missing_metrics_are_not_violations() {
        let verdict = classify(&SmoothedMetrics::default(), &baseline(), PostureState::Bad);
        assert!(!verdict.is_bad);
        assert_eq!(verdict.adjusted, AdjustedMetrics::default());
        assert_eq!(verdict.compensation, CompensationStatus::Undetermined);
    }

    #[test]
    fn test_adjusted_relative_to_baseline() {
        let base = Baseline {
            pitch: -4.0,
            roll: 2.0,
            distance: 60.0,
            shoulder_tilt: -1.0,
        };
        let adjusted = AdjustedMetrics::relative_to(&smoothed(-6.0, 5.0, 1.0, 52.0), &base);
        assert_eq!(adjusted.pitch, Some(-2.0));
        assert_eq!(adjusted.roll, Some(3.0));
        assert_eq!(adjusted.shoulder_tilt, Some(2.0));
        assert_eq!(adjusted.distance_deviation, Some(8.0));
    }
}
