//! Configuration management for the posture monitor

use crate::{
    constants::{
        DEFAULT_BAD_TO_GOOD_FRAMES, DEFAULT_COMPENSATION_RATIO, DEFAULT_FACE_BBOX_PADDING, DEFAULT_GAP_RESET_MS,
        DEFAULT_GOOD_TO_BAD_FRAMES, DEFAULT_INITIAL_WARNING_SECONDS, DEFAULT_MIN_SHOULDER_VISIBILITY,
        DEFAULT_MIN_TILT, DEFAULT_REPEAT_WARNING_INTERVAL, DEFAULT_SMOOTHING_WINDOW, DEFAULT_YAW_THRESHOLD,
    },
    thresholds::{SensitivityUpdate, ThresholdSet},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Median smoothing configuration
    pub smoothing: SmoothingConfig,

    /// State debounce configuration
    pub debounce: DebounceConfig,

    /// Raw enter/exit thresholds
    pub thresholds: ThresholdSet,

    /// Optional per-metric sensitivity scales (1-5), overriding `thresholds`
    pub sensitivity: SensitivityUpdate,

    /// Classification parameters
    pub classification: ClassificationConfig,

    /// Compensation detection parameters
    pub compensation: CompensationConfig,

    /// Warning cadence
    pub warnings: WarningConfig,

    /// Landmark handling
    pub detection: DetectionConfig,
}

/// Smoothing filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Number of recent samples per metric
    pub window_size: usize,
}

/// Debouncer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Consecutive bad frames needed to enter Bad
    pub good_to_bad_frames: u32,

    /// Consecutive good frames needed to leave Bad
    pub bad_to_good_frames: u32,

    /// Pause after which the frame counters restart
    pub gap_reset_ms: u64,
}

/// Classification configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Roll, shoulder and compensation checks run only below this |yaw| (degrees)
    pub yaw_threshold: f64,
}

/// Compensation detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationConfig {
    /// Minimum tilt (degrees) before compensation is considered
    pub min_tilt: f64,

    /// Minimum smaller/larger tilt ratio
    pub ratio_threshold: f64,
}

/// Warning cadence configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningConfig {
    /// First warning after this many seconds of bad posture
    pub initial_warning_seconds: u64,

    /// Then repeat every this many seconds
    pub repeat_warning_interval: u64,
}

/// Landmark handling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Shoulders below this visibility are ignored (0.0-1.0)
    pub min_shoulder_visibility: f64,

    /// Face bounding box padding as a fraction of the shorter frame side
    pub face_bbox_padding: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            good_to_bad_frames: DEFAULT_GOOD_TO_BAD_FRAMES,
            bad_to_good_frames: DEFAULT_BAD_TO_GOOD_FRAMES,
            gap_reset_ms: DEFAULT_GAP_RESET_MS,
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            yaw_threshold: DEFAULT_YAW_THRESHOLD,
        }
    }
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            min_tilt: DEFAULT_MIN_TILT,
            ratio_threshold: DEFAULT_COMPENSATION_RATIO,
        }
    }
}

impl Default for WarningConfig {
    fn default() -> Self {
        Self {
            initial_warning_seconds: DEFAULT_INITIAL_WARNING_SECONDS,
            repeat_warning_interval: DEFAULT_REPEAT_WARNING_INTERVAL,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_shoulder_visibility: DEFAULT_MIN_SHOULDER_VISIBILITY,
            face_bbox_padding: DEFAULT_FACE_BBOX_PADDING,
        }
    }
}

impl DebounceConfig {
    pub fn gap_reset(&self) -> Duration {
        Duration::from_millis(self.gap_reset_ms)
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::IoError(e.to_string()))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the YAML is malformed
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| Error::IoError(e.to_string()))?;

        Ok(())
    }

    /// Effective thresholds: raw pairs with any sensitivity scales applied
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if a scale is out of range
    pub fn thresholds(&self) -> Result<ThresholdSet> {
        let mut thresholds = self.thresholds;
        thresholds.apply_sensitivity(&self.sensitivity)?;
        Ok(thresholds)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` naming the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if self.smoothing.window_size == 0 {
            return Err(Error::ConfigError(
                "Smoothing window size must be greater than 0".to_string(),
            ));
        }

        if self.debounce.good_to_bad_frames == 0 || self.debounce.bad_to_good_frames == 0 {
            return Err(Error::ConfigError(
                "Debounce frame counts must be greater than 0".to_string(),
            ));
        }

        self.thresholds.validate()?;
        self.sensitivity.validate()?;

        if !(self.classification.yaw_threshold > 0.0 && self.classification.yaw_threshold <= 90.0) {
            return Err(Error::ConfigError(
                "Yaw threshold must be in (0, 90] degrees".to_string(),
            ));
        }

        if !(self.compensation.ratio_threshold > 0.0 && self.compensation.ratio_threshold <= 1.0) {
            return Err(Error::ConfigError(
                "Compensation ratio threshold must be in (0.0, 1.0]".to_string(),
            ));
        }
        if !(self.compensation.min_tilt >= 0.0) {
            return Err(Error::ConfigError(
                "Compensation minimum tilt must not be negative".to_string(),
            ));
        }

        if self.warnings.repeat_warning_interval == 0 {
            return Err(Error::ConfigError(
                "Repeat warning interval must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.detection.min_shoulder_visibility) {
            return Err(Error::ConfigError(
                "Minimum shoulder visibility must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(self.detection.face_bbox_padding >= 0.0) {
            return Err(Error::ConfigError(
                "Face bounding box padding must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Posture Monitor Configuration

# Median smoothing
smoothing:
  window_size: 5

# State debouncing
debounce:
  good_to_bad_frames: 2
  bad_to_good_frames: 3
  gap_reset_ms: 1000

# Raw thresholds (degrees, distance deviation in cm)
thresholds:
  pitch: { enter: -10.0, exit: -8.0 }
  distance: { enter: 10.0, exit: 8.0 }
  head_roll: { enter: 15.0, exit: 12.0 }
  shoulder_tilt: { enter: 5.0, exit: 3.0 }

# Sensitivity scales 1 (lenient) to 5 (strict); override the raw thresholds
sensitivity: {}
  # pitch: 3.0
  # distance: 3.0
  # head_roll: 3.0
  # shoulder_tilt: 3.0

# Classification
classification:
  yaw_threshold: 30.0

# Compensation detection
compensation:
  min_tilt: 2.0
  ratio_threshold: 0.7

# Warning cadence (seconds)
warnings:
  initial_warning_seconds: 10
  repeat_warning_interval: 20

# Landmark handling
detection:
  min_shoulder_visibility: 0.4
  face_bbox_padding: 0.1
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thresholds::ThresholdPair;

    #[test]
    fn test_example_config_matches_default() {
        let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_yaml("smoothing:\n  window_size: 7\n").unwrap();
        assert_eq!(config.smoothing.window_size, 7);
        assert_eq!(config.debounce, DebounceConfig::default());
    }

    #[test]
    fn test_sensitivity_overrides_raw_thresholds() {
        let config = Config::from_yaml("sensitivity:\n  pitch: 5.0\n").unwrap();
        let thresholds = config.thresholds().unwrap();
        assert_eq!(thresholds.pitch, ThresholdPair::new(-5.0, -3.0));
        assert_eq!(thresholds.distance, ThresholdPair::new(10.0, 8.0));
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = Config::default();
        config.smoothing.window_size = 0;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_ratio_out_of_range() {
        let mut config = Config::default();
        config.compensation.ratio_threshold = 1.5;
        assert!(config.validate().is_err());
        config.compensation.ratio_threshold = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_misordered_thresholds() {
        let mut config = Config::default();
        config.thresholds.head_roll = ThresholdPair::new(10.0, 12.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            Config::from_yaml("smoothing: [not, a, map]"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_unknown_threshold_metric_rejected() {
        let yaml = "thresholds:\n  body_lean:\n    enter: 3.0\n    exit: 2.0\n";
        assert!(matches!(Config::from_yaml(yaml), Err(Error::ConfigError(_))));
    }
}
