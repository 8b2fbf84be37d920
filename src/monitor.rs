//! A single user's classification session.
//!
//! `PostureMonitor` owns every stateful stage of the pipeline and processes
//! one frame to completion before the next: extraction, smoothing, threshold
//! evaluation against the previous stable state, debouncing, then session
//! timing. Calibration and threshold updates go through `&mut self`, so they
//! can never interleave with an in-flight frame.

use crate::{
    baseline::{Baseline, BaselineStore},
    classifier::{PostureClassifier, PostureIssue},
    compensation::{CompensationDetector, CompensationStatus},
    config::Config,
    debouncer::{PostureState, StateDebouncer, TransitionProgress},
    features::{FeatureExtractor, FrameFeatures},
    filters::SmoothingFilter,
    landmarks::FrameInput,
    pose_estimation::PoseEstimator,
    session::{warning_message, SessionAnalyzer, SessionStatistics},
    solver::{PerspectiveSolver, PositSolver},
    thresholds::{RawThresholdUpdate, SensitivityUpdate, ThresholdSet},
    utils::BoundingBox,
    Result,
};
use serde::{Deserialize, Serialize};

pub const NO_FACE_ERROR: &str = "no face detected";
pub const NO_BASELINE_ERROR: &str = "no baseline posture saved";

/// Flat per-frame result handed to the transport layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub timestamp_ms: u64,
    /// Debounced verdict
    pub is_bad: bool,
    /// This frame's verdict before debouncing
    pub raw_is_bad: bool,
    pub issues: Vec<PostureIssue>,
    pub pitch: Option<f64>,
    pub yaw: Option<f64>,
    pub roll: Option<f64>,
    pub shoulder_tilt: Option<f64>,
    pub distance: Option<f64>,
    pub adjusted_pitch: Option<f64>,
    pub adjusted_roll: Option<f64>,
    pub adjusted_shoulder_tilt: Option<f64>,
    pub distance_deviation: Option<f64>,
    pub compensation: CompensationStatus,
    pub compensation_description: Option<String>,
    pub head_facing_forward: bool,
    pub shoulder_detection_active: bool,
    pub face_bbox: Option<BoundingBox>,
    pub bad_duration: Option<u64>,
    pub warning: Option<String>,
    pub debounce: TransitionProgress,
    pub error: Option<String>,
}

impl ClassificationResult {
    fn unclassified(frame: &FrameInput, debounce: TransitionProgress, error: &str) -> Self {
        Self {
            timestamp_ms: timestamp_ms(frame),
            is_bad: false,
            raw_is_bad: false,
            issues: Vec::new(),
            pitch: None,
            yaw: None,
            roll: None,
            shoulder_tilt: None,
            distance: None,
            adjusted_pitch: None,
            adjusted_roll: None,
            adjusted_shoulder_tilt: None,
            distance_deviation: None,
            compensation: CompensationStatus::Undetermined,
            compensation_description: None,
            head_facing_forward: false,
            shoulder_detection_active: false,
            face_bbox: None,
            bad_duration: None,
            warning: None,
            debounce,
            error: Some(error.to_string()),
        }
    }

    fn with_raw_features(mut self, features: &FrameFeatures) -> Self {
        self.pitch = features.metrics.pitch;
        self.yaw = features.metrics.yaw;
        self.roll = features.metrics.roll;
        self.shoulder_tilt = features.metrics.shoulder_tilt;
        self.distance = features.metrics.distance;
        self.shoulder_detection_active = features.shoulder_detection_active;
        self.face_bbox = features.face_bbox;
        self
    }
}

/// Outcome of a calibration request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub success: bool,
    /// The baseline in effect after the request
    pub baseline: Option<Baseline>,
    pub error: Option<String>,
}

#[allow(clippy::cast_possible_truncation)]
fn timestamp_ms(frame: &FrameInput) -> u64 {
    frame.timestamp.as_millis() as u64
}

pub struct PostureMonitor {
    extractor: FeatureExtractor,
    baseline: BaselineStore,
    smoothing: SmoothingFilter,
    thresholds: ThresholdSet,
    classifier: PostureClassifier,
    debouncer: StateDebouncer,
    session: SessionAnalyzer,
    last_issues: Vec<PostureIssue>,
    last_compensation: Option<String>,
}

impl Default for PostureMonitor {
    fn default() -> Self {
        Self {
            extractor: FeatureExtractor::default(),
            baseline: BaselineStore::new(),
            smoothing: SmoothingFilter::new(crate::constants::DEFAULT_SMOOTHING_WINDOW),
            thresholds: ThresholdSet::default(),
            classifier: PostureClassifier::default(),
            debouncer: StateDebouncer::default(),
            session: SessionAnalyzer::default(),
            last_issues: Vec::new(),
            last_compensation: None,
        }
    }
}

impl PostureMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a session from validated configuration using the built-in solver
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the configuration is invalid
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_solver(config, Box::new(PositSolver::default()))
    }

    /// Build a session with a specific perspective solver
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the configuration is invalid
    pub fn with_solver(config: &Config, solver: Box<dyn PerspectiveSolver>) -> Result<Self> {
        config.validate()?;
        let thresholds = config.thresholds()?;

        let extractor = FeatureExtractor::new(
            PoseEstimator::new(solver),
            config.detection.min_shoulder_visibility,
            config.detection.face_bbox_padding,
        );
        let classifier = PostureClassifier::new(
            config.classification.yaw_threshold,
            CompensationDetector::new(config.compensation.min_tilt, config.compensation.ratio_threshold),
        );

        Ok(Self {
            extractor,
            baseline: BaselineStore::new(),
            smoothing: SmoothingFilter::new(config.smoothing.window_size),
            thresholds,
            classifier,
            debouncer: StateDebouncer::new(
                config.debounce.good_to_bad_frames,
                config.debounce.bad_to_good_frames,
                config.debounce.gap_reset(),
            ),
            session: SessionAnalyzer::new(
                config.warnings.initial_warning_seconds,
                config.warnings.repeat_warning_interval,
            ),
            last_issues: Vec::new(),
            last_compensation: None,
        })
    }

    /// Run one frame through the pipeline
    ///
    /// Frames without a face or before calibration are reported through the
    /// result's `error` field and leave all session state untouched.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for malformed frames, with no state change
    pub fn classify(&mut self, frame: &FrameInput) -> Result<ClassificationResult> {
        frame.validate()?;

        let Some(features) = self.extractor.extract(frame) else {
            return Ok(ClassificationResult::unclassified(
                frame,
                self.debouncer.transition_progress(),
                NO_FACE_ERROR,
            ));
        };
        let Some(baseline) = self.baseline.get().copied() else {
            return Ok(ClassificationResult::unclassified(
                frame,
                self.debouncer.transition_progress(),
                NO_BASELINE_ERROR,
            )
            .with_raw_features(&features));
        };

        let metrics = features.metrics;
        self.smoothing
            .add_sample(metrics.pitch, metrics.roll, metrics.shoulder_tilt, metrics.distance);
        let smoothed = self.smoothing.smoothed_values();

        // Evaluate against the previous stable state, then commit
        let previous = self.debouncer.current();
        let verdict = self
            .classifier
            .classify(&smoothed, metrics.yaw, &baseline, &self.thresholds, previous);
        let state = self.debouncer.update(verdict.is_bad, frame.timestamp);
        let session = self.session.update(state, frame.timestamp);

        if verdict.is_bad {
            self.last_issues.clone_from(&verdict.issues);
            self.last_compensation = verdict.compensation.description().map(str::to_string);
        }

        let warning = match session.bad_duration {
            Some(duration) if session.should_warn => {
                let message = warning_message(&self.last_issues, duration, self.last_compensation.as_deref());
                log::info!("{}", message);
                Some(message)
            }
            _ => None,
        };

        Ok(ClassificationResult {
            timestamp_ms: timestamp_ms(frame),
            is_bad: state.is_bad(),
            raw_is_bad: verdict.is_bad,
            pitch: smoothed.pitch,
            yaw: metrics.yaw,
            roll: smoothed.roll,
            shoulder_tilt: smoothed.shoulder_tilt,
            distance: smoothed.distance,
            adjusted_pitch: verdict.adjusted.pitch,
            adjusted_roll: verdict.adjusted.roll,
            adjusted_shoulder_tilt: verdict.adjusted.shoulder_tilt,
            distance_deviation: verdict.adjusted.distance_deviation,
            compensation_description: verdict.compensation.description().map(str::to_string),
            compensation: verdict.compensation,
            head_facing_forward: verdict.head_facing_forward,
            shoulder_detection_active: features.shoulder_detection_active,
            face_bbox: features.face_bbox,
            bad_duration: session.bad_duration,
            warning,
            debounce: self.debouncer.transition_progress(),
            issues: verdict.issues,
            error: None,
        })
    }

    /// Save the frame's raw metrics as the new baseline
    ///
    /// On success the smoothing history is cleared and the stable state is
    /// forced to Good. On failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for malformed frames
    pub fn calibrate(&mut self, frame: &FrameInput) -> Result<CalibrationResult> {
        frame.validate()?;

        let Some(features) = self.extractor.extract(frame) else {
            log::warn!("Calibration failed: {}", NO_FACE_ERROR);
            return Ok(CalibrationResult {
                success: false,
                baseline: self.baseline.get().copied(),
                error: Some(NO_FACE_ERROR.to_string()),
            });
        };

        if !self.baseline.calibrate(&features.metrics) {
            return Ok(CalibrationResult {
                success: false,
                baseline: self.baseline.get().copied(),
                error: Some("pitch or distance unavailable".to_string()),
            });
        }

        self.smoothing.reset();
        self.debouncer.force_state(PostureState::Good);
        self.last_issues.clear();
        self.last_compensation = None;

        Ok(CalibrationResult {
            success: true,
            baseline: self.baseline.get().copied(),
            error: None,
        })
    }

    /// # Errors
    ///
    /// Returns `Error::ConfigError` if any scale is outside [1, 5]; no
    /// threshold changes in that case
    pub fn update_sensitivity(&mut self, update: &SensitivityUpdate) -> Result<()> {
        self.thresholds.apply_sensitivity(update)?;
        log::info!("Sensitivity updated: {:?}", self.thresholds);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Error::ConfigError` if any pair is mis-ordered; no threshold
    /// changes in that case
    pub fn update_raw_thresholds(&mut self, update: &RawThresholdUpdate) -> Result<()> {
        self.thresholds.apply_raw(update)?;
        log::info!("Thresholds updated: {:?}", self.thresholds);
        Ok(())
    }

    pub fn statistics(&self) -> SessionStatistics {
        self.session.statistics()
    }

    pub fn reset_statistics(&mut self) {
        self.session.reset_statistics();
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.get()
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    pub fn state(&self) -> PostureState {
        self.debouncer.current()
    }

    pub fn solver_name(&self) -> &str {
        self.extractor.pose_estimator().solver_name()
    }
}
