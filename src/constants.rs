//! Constants used throughout the pipeline

/// Face mesh index of the nose tip
pub const NOSE_TIP: usize = 1;

/// Face mesh index of the chin
pub const CHIN: usize = 152;

/// Face mesh index of the right eye outer corner (image left on an unmirrored frame)
pub const RIGHT_EYE_OUTER: usize = 33;

/// Face mesh index of the left eye outer corner
pub const LEFT_EYE_OUTER: usize = 263;

/// Face mesh index of the right mouth corner
pub const RIGHT_MOUTH_CORNER: usize = 61;

/// Face mesh index of the left mouth corner
pub const LEFT_MOUTH_CORNER: usize = 291;

/// Face mesh index of the right pupil (iris refinement points)
pub const RIGHT_PUPIL: usize = 468;

/// Face mesh index of the left pupil
pub const LEFT_PUPIL: usize = 473;

/// Body pose index of the left shoulder
pub const LEFT_SHOULDER: usize = 11;

/// Body pose index of the right shoulder
pub const RIGHT_SHOULDER: usize = 12;

/// Body landmark sets shorter than this cannot contain both shoulders
pub const MIN_POSE_LANDMARKS: usize = 13;

/// Average adult interpupillary distance in centimeters
pub const AVERAGE_IPD_CM: f64 = 6.3;

/// Camera matrix center factor
pub const CAMERA_CENTER_FACTOR: f64 = 2.0;

/// Below this `sy` the rotation matrix is treated as gimbal locked
pub const GIMBAL_LOCK_EPSILON: f64 = 1e-6;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;

/// Default smoothing window size
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Default debounce frame counts
pub const DEFAULT_GOOD_TO_BAD_FRAMES: u32 = 2;
pub const DEFAULT_BAD_TO_GOOD_FRAMES: u32 = 3;

/// Update gap after which debounce counters are discarded
pub const DEFAULT_GAP_RESET_MS: u64 = 1000;

/// Yaw beyond which roll, shoulder tilt and compensation are not evaluated
pub const DEFAULT_YAW_THRESHOLD: f64 = 30.0;

/// Compensation detection defaults
pub const DEFAULT_MIN_TILT: f64 = 2.0;
pub const DEFAULT_COMPENSATION_RATIO: f64 = 0.7;

/// Warning cadence defaults in seconds
pub const DEFAULT_INITIAL_WARNING_SECONDS: u64 = 10;
pub const DEFAULT_REPEAT_WARNING_INTERVAL: u64 = 20;

/// Shoulder landmarks below this visibility are ignored
pub const DEFAULT_MIN_SHOULDER_VISIBILITY: f64 = 0.4;

/// Face box padding as a fraction of the shorter frame side
pub const DEFAULT_FACE_BBOX_PADDING: f64 = 0.1;

/// Sensitivity scale bounds
pub const SENSITIVITY_MIN: f64 = 1.0;
pub const SENSITIVITY_MAX: f64 = 5.0;
pub const DEFAULT_SENSITIVITY: f64 = 3.0;
