//! Hysteresis thresholds and the 1-5 sensitivity scale.
//!
//! Every tunable metric has an `enter` bound (strict, used while the stable
//! state is Good) and an `exit` bound (lenient, used while it is Bad). The
//! stable state is passed in explicitly; evaluating a bound never mutates it.

use crate::{
    constants::{DEFAULT_SENSITIVITY, SENSITIVITY_MAX, SENSITIVITY_MIN},
    debouncer::PostureState,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enter/exit bound pair for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    /// Strict bound crossed to go from good to bad
    pub enter: f64,
    /// Lenient bound that must be satisfied to leave bad
    pub exit: f64,
}

impl ThresholdPair {
    pub const fn new(enter: f64, exit: f64) -> Self {
        Self { enter, exit }
    }

    /// Bound to compare against for the given stable state
    pub fn bound_for(&self, state: PostureState) -> f64 {
        match state {
            PostureState::Good => self.enter,
            PostureState::Bad => self.exit,
        }
    }

    fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            enter: self.enter + (other.enter - self.enter) * t,
            exit: self.exit + (other.exit - self.exit) * t,
        }
    }

    /// Check that `enter` is stricter than `exit` in the metric's bad direction
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` describing the violated ordering
    pub fn validate(&self, metric: Metric) -> Result<()> {
        if !self.enter.is_finite() || !self.exit.is_finite() {
            return Err(Error::ConfigError(format!("{metric} thresholds must be finite")));
        }
        let ordered = match metric.mode() {
            ViolationMode::LowerIsBad => self.enter < self.exit,
            ViolationMode::HigherIsBad => self.enter > self.exit,
            ViolationMode::AbsoluteIsBad => self.enter > self.exit && self.exit >= 0.0,
        };
        if ordered {
            Ok(())
        } else {
            Err(Error::ConfigError(format!(
                "{metric} enter threshold {} must be stricter than exit threshold {}",
                self.enter, self.exit
            )))
        }
    }
}

/// Direction in which a metric value is considered bad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationMode {
    /// Violated when the value drops below the bound
    LowerIsBad,
    /// Violated when the value rises above the bound
    HigherIsBad,
    /// Violated when the magnitude exceeds the bound
    AbsoluteIsBad,
}

impl ViolationMode {
    pub fn exceeds(self, value: f64, bound: f64) -> bool {
        match self {
            Self::LowerIsBad => value < bound,
            Self::HigherIsBad => value > bound,
            Self::AbsoluteIsBad => value.abs() > bound,
        }
    }
}

/// Hysteresis check: strict `enter` bound while Good, lenient `exit` bound while Bad
pub fn violates(value: f64, thresholds: &ThresholdPair, mode: ViolationMode, state: PostureState) -> bool {
    mode.exceeds(value, thresholds.bound_for(state))
}

/// Metrics with tunable thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Pitch,
    Distance,
    HeadRoll,
    ShoulderTilt,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Pitch, Metric::Distance, Metric::HeadRoll, Metric::ShoulderTilt];

    pub fn mode(self) -> ViolationMode {
        match self {
            Self::Pitch => ViolationMode::LowerIsBad,
            Self::Distance => ViolationMode::HigherIsBad,
            Self::HeadRoll | Self::ShoulderTilt => ViolationMode::AbsoluteIsBad,
        }
    }

    /// Anchors for sensitivity 1 (lenient) through 5 (strict)
    pub fn anchors(self) -> &'static [ThresholdPair; 5] {
        match self {
            Self::Pitch => &PITCH_ANCHORS,
            Self::Distance => &DISTANCE_ANCHORS,
            Self::HeadRoll => &HEAD_ROLL_ANCHORS,
            Self::ShoulderTilt => &SHOULDER_TILT_ANCHORS,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pitch => "pitch",
            Self::Distance => "distance",
            Self::HeadRoll => "head_roll",
            Self::ShoulderTilt => "shoulder_tilt",
        };
        f.write_str(name)
    }
}

/// Degrees below baseline pitch (looking down)
pub const PITCH_ANCHORS: [ThresholdPair; 5] = [
    ThresholdPair::new(-20.0, -16.0),
    ThresholdPair::new(-15.0, -12.0),
    ThresholdPair::new(-10.0, -8.0),
    ThresholdPair::new(-7.0, -5.0),
    ThresholdPair::new(-5.0, -3.0),
];

/// Centimeters closer to the camera than baseline
pub const DISTANCE_ANCHORS: [ThresholdPair; 5] = [
    ThresholdPair::new(20.0, 16.0),
    ThresholdPair::new(15.0, 12.0),
    ThresholdPair::new(10.0, 8.0),
    ThresholdPair::new(7.0, 5.0),
    ThresholdPair::new(5.0, 3.0),
];

/// Degrees of head tilt away from baseline
pub const HEAD_ROLL_ANCHORS: [ThresholdPair; 5] = [
    ThresholdPair::new(25.0, 20.0),
    ThresholdPair::new(20.0, 16.0),
    ThresholdPair::new(15.0, 12.0),
    ThresholdPair::new(12.0, 9.0),
    ThresholdPair::new(8.0, 6.0),
];

/// Degrees of shoulder line tilt away from baseline
pub const SHOULDER_TILT_ANCHORS: [ThresholdPair; 5] = [
    ThresholdPair::new(10.0, 7.0),
    ThresholdPair::new(7.0, 5.0),
    ThresholdPair::new(5.0, 3.0),
    ThresholdPair::new(4.0, 2.5),
    ThresholdPair::new(3.0, 2.0),
];

/// Map a sensitivity in [1, 5] onto the anchor table, interpolating linearly
/// between neighbouring integer anchors. Out-of-range scales are clamped and
/// a non-finite scale falls back to the default sensitivity.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // floor of a value clamped to [1, 5]
pub fn scale_to_threshold(scale: f64, anchors: &[ThresholdPair; 5]) -> ThresholdPair {
    let scale = if scale.is_finite() { scale } else { DEFAULT_SENSITIVITY };
    let scale = scale.clamp(SENSITIVITY_MIN, SENSITIVITY_MAX);

    let lower = scale.floor();
    let index = lower as usize - 1;
    let fraction = scale - lower;
    if fraction == 0.0 {
        return anchors[index];
    }
    anchors[index].lerp(&anchors[index + 1], fraction)
}

/// Per-metric sensitivity changes; `None` leaves a metric untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityUpdate {
    pub pitch: Option<f64>,
    pub distance: Option<f64>,
    pub head_roll: Option<f64>,
    pub shoulder_tilt: Option<f64>,
}

impl SensitivityUpdate {
    fn entries(&self) -> [(Metric, Option<f64>); 4] {
        [
            (Metric::Pitch, self.pitch),
            (Metric::Distance, self.distance),
            (Metric::HeadRoll, self.head_roll),
            (Metric::ShoulderTilt, self.shoulder_tilt),
        ]
    }

    /// # Errors
    ///
    /// Returns `Error::ConfigError` if a scale is outside [1, 5]
    pub fn validate(&self) -> Result<()> {
        for (metric, scale) in self.entries() {
            if let Some(scale) = scale {
                if !(SENSITIVITY_MIN..=SENSITIVITY_MAX).contains(&scale) {
                    return Err(Error::ConfigError(format!(
                        "{metric} sensitivity must be between {SENSITIVITY_MIN} and {SENSITIVITY_MAX}, got {scale}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Per-metric raw threshold replacements; `None` leaves a metric untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawThresholdUpdate {
    pub pitch: Option<ThresholdPair>,
    pub distance: Option<ThresholdPair>,
    pub head_roll: Option<ThresholdPair>,
    pub shoulder_tilt: Option<ThresholdPair>,
}

impl RawThresholdUpdate {
    fn entries(&self) -> [(Metric, Option<ThresholdPair>); 4] {
        [
            (Metric::Pitch, self.pitch),
            (Metric::Distance, self.distance),
            (Metric::HeadRoll, self.head_roll),
            (Metric::ShoulderTilt, self.shoulder_tilt),
        ]
    }
}

/// Active thresholds for all tunable metrics. Unknown metric names are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdSet {
    pub pitch: ThresholdPair,
    pub distance: ThresholdPair,
    pub head_roll: ThresholdPair,
    pub shoulder_tilt: ThresholdPair,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self::from_sensitivity(DEFAULT_SENSITIVITY)
    }
}

impl ThresholdSet {
    /// Same sensitivity for every metric
    pub fn from_sensitivity(scale: f64) -> Self {
        Self {
            pitch: scale_to_threshold(scale, Metric::Pitch.anchors()),
            distance: scale_to_threshold(scale, Metric::Distance.anchors()),
            head_roll: scale_to_threshold(scale, Metric::HeadRoll.anchors()),
            shoulder_tilt: scale_to_threshold(scale, Metric::ShoulderTilt.anchors()),
        }
    }

    pub fn get(&self, metric: Metric) -> &ThresholdPair {
        match metric {
            Metric::Pitch => &self.pitch,
            Metric::Distance => &self.distance,
            Metric::HeadRoll => &self.head_roll,
            Metric::ShoulderTilt => &self.shoulder_tilt,
        }
    }

    fn get_mut(&mut self, metric: Metric) -> &mut ThresholdPair {
        match metric {
            Metric::Pitch => &mut self.pitch,
            Metric::Distance => &mut self.distance,
            Metric::HeadRoll => &mut self.head_roll,
            Metric::ShoulderTilt => &mut self.shoulder_tilt,
        }
    }

    /// Hysteresis check of `value` against this metric's pair
    pub fn violates(&self, metric: Metric, value: f64, state: PostureState) -> bool {
        violates(value, self.get(metric), metric.mode(), state)
    }

    /// # Errors
    ///
    /// Returns `Error::ConfigError` if any pair is mis-ordered
    pub fn validate(&self) -> Result<()> {
        Metric::ALL.iter().try_for_each(|&metric| self.get(metric).validate(metric))
    }

    /// Re-derive thresholds from sensitivity scales. Nothing changes if any
    /// scale is invalid.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if a scale is outside [1, 5]
    pub fn apply_sensitivity(&mut self, update: &SensitivityUpdate) -> Result<()> {
        update.validate()?;
        for (metric, scale) in update.entries() {
            if let Some(scale) = scale {
                *self.get_mut(metric) = scale_to_threshold(scale, metric.anchors());
            }
        }
        Ok(())
    }

    /// Replace raw pairs. The update is applied all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if any supplied pair is mis-ordered
    pub fn apply_raw(&mut self, update: &RawThresholdUpdate) -> Result<()> {
        for (metric, pair) in update.entries() {
            if let Some(pair) = pair {
                pair.validate(metric)?;
            }
        }
        for (metric, pair) in update.entries() {
            if let Some(pair) = pair {
                *self.get_mut(metric) = pair;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_pair_eq(actual: ThresholdPair, expected: ThresholdPair) {
        assert!(
            (actual.enter - expected.enter).abs() < 1e-12 && (actual.exit - expected.exit).abs() < 1e-12,
            "got {actual:?}, expected {expected:?}"
        );
    }

    #[test]
    fn test_default_matches_middle_anchor() {
        let set = ThresholdSet::default();
        assert_eq!(set.pitch, ThresholdPair::new(-10.0, -8.0));
        assert_eq!(set.distance, ThresholdPair::new(10.0, 8.0));
        assert_eq!(set.head_roll, ThresholdPair::new(15.0, 12.0));
        assert_eq!(set.shoulder_tilt, ThresholdPair::new(5.0, 3.0));
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_scale_integral_returns_anchor() {
        for metric in Metric::ALL {
            for (i, anchor) in metric.anchors().iter().enumerate() {
                let scale = (i + 1) as f64;
                assert_eq!(scale_to_threshold(scale, metric.anchors()), *anchor);
            }
        }
    }

    #[test]
    fn test_scale_interpolates_halfway() {
        let pair = scale_to_threshold(3.5, &PITCH_ANCHORS);
        assert_pair_eq(pair, ThresholdPair::new(-8.5, -6.5));

        let pair = scale_to_threshold(1.25, &HEAD_ROLL_ANCHORS);
        assert_pair_eq(pair, ThresholdPair::new(23.75, 19.0));
    }

    #[test]
    fn test_scale_is_clamped() {
        assert_eq!(scale_to_threshold(0.0, &DISTANCE_ANCHORS), DISTANCE_ANCHORS[0]);
        assert_eq!(scale_to_threshold(9.0, &DISTANCE_ANCHORS), DISTANCE_ANCHORS[4]);
        assert_eq!(scale_to_threshold(f64::NAN, &DISTANCE_ANCHORS), DISTANCE_ANCHORS[2]);
    }

    #[test]
    fn test_all_anchors_are_well_ordered() {
        for metric in Metric::ALL {
            for anchor in metric.anchors() {
                assert!(anchor.validate(metric).is_ok(), "{metric} anchor {anchor:?}");
            }
        }
    }

    #[test]
    fn test_hysteresis_lower_is_bad() {
        let pair = ThresholdPair::new(-10.0, -8.0);
        // -9 is not bad enough to enter, but keeps an existing bad state
        assert!(!violates(-9.0, &pair, ViolationMode::LowerIsBad, PostureState::Good));
        assert!(violates(-9.0, &pair, ViolationMode::LowerIsBad, PostureState::Bad));
        assert!(violates(-11.0, &pair, ViolationMode::LowerIsBad, PostureState::Good));
        assert!(!violates(-7.0, &pair, ViolationMode::LowerIsBad, PostureState::Bad));
    }

    #[test]
    fn test_hysteresis_absolute() {
        let pair = ThresholdPair::new(15.0, 12.0);
        assert!(violates(20.0, &pair, ViolationMode::AbsoluteIsBad, PostureState::Good));
        assert!(violates(-16.0, &pair, ViolationMode::AbsoluteIsBad, PostureState::Good));
        assert!(!violates(13.0, &pair, ViolationMode::AbsoluteIsBad, PostureState::Good));
        assert!(violates(-13.0, &pair, ViolationMode::AbsoluteIsBad, PostureState::Bad));
        assert!(!violates(11.0, &pair, ViolationMode::AbsoluteIsBad, PostureState::Bad));
    }

    #[test]
    fn test_hysteresis_higher_is_bad() {
        let pair = ThresholdPair::new(10.0, 8.0);
        assert!(violates(15.0, &pair, ViolationMode::HigherIsBad, PostureState::Good));
        assert!(!violates(9.0, &pair, ViolationMode::HigherIsBad, PostureState::Good));
        assert!(violates(9.0, &pair, ViolationMode::HigherIsBad, PostureState::Bad));
    }

    #[test]
    fn test_apply_sensitivity() {
        let mut set = ThresholdSet::default();
        set.apply_sensitivity(&SensitivityUpdate {
            pitch: Some(5.0),
            head_roll: Some(1.0),
            ..SensitivityUpdate::default()
        })
        .unwrap();
        assert_eq!(set.pitch, PITCH_ANCHORS[4]);
        assert_eq!(set.head_roll, HEAD_ROLL_ANCHORS[0]);
        assert_eq!(set.distance, DISTANCE_ANCHORS[2]);
    }

    #[test]
    fn test_apply_sensitivity_rejects_out_of_range() {
        let mut set = ThresholdSet::default();
        let result = set.apply_sensitivity(&SensitivityUpdate {
            pitch: Some(2.0),
            distance: Some(6.0),
            ..SensitivityUpdate::default()
        });
        assert!(matches!(result, Err(Error::ConfigError(_))));
        assert_eq!(set, ThresholdSet::default());
    }

    #[test]
    fn test_apply_raw_is_all_or_nothing() {
        let mut set = ThresholdSet::default();
        let result = set.apply_raw(&RawThresholdUpdate {
            pitch: Some(ThresholdPair::new(-12.0, -9.0)),
            head_roll: Some(ThresholdPair::new(10.0, 14.0)),
            ..RawThresholdUpdate::default()
        });
        assert!(result.is_err());
        assert_eq!(set, ThresholdSet::default());

        set.apply_raw(&RawThresholdUpdate {
            pitch: Some(ThresholdPair::new(-12.0, -9.0)),
            ..RawThresholdUpdate::default()
        })
        .unwrap();
        assert_eq!(set.pitch, ThresholdPair::new(-12.0, -9.0));
    }
}
