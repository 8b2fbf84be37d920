//! Landmark input produced by the external face and body detectors.
//!
//! Coordinates are normalized to the frame (`0.0..=1.0` for on-screen points),
//! `z` is the detector's relative depth and `visibility` its per-point confidence
//! when the model reports one.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single detected landmark
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default)]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0, visibility: None }
    }

    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// Position in pixels for a frame of the given size
    pub fn to_pixels(&self, width: u32, height: u32) -> (f64, f64) {
        (self.x * f64::from(width), self.y * f64::from(height))
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Ordered landmarks for one frame, indexed by the detector's topology
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet(pub Vec<Landmark>);

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self(points)
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        self.0.iter()
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    fn from(points: Vec<Landmark>) -> Self {
        Self(points)
    }
}

/// Everything the pipeline needs to know about one camera frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    pub width: u32,
    pub height: u32,
    /// Monotonic time since the start of the stream
    #[serde(rename = "timestamp_ms", with = "duration_ms")]
    pub timestamp: Duration,
    /// Face mesh landmarks, `None` when no face was detected
    #[serde(default)]
    pub face: Option<LandmarkSet>,
    /// Body pose landmarks, `None` when no body was detected
    #[serde(default)]
    pub pose: Option<LandmarkSet>,
}

impl FrameInput {
    pub fn new(width: u32, height: u32, timestamp: Duration) -> Self {
        Self { width, height, timestamp, face: None, pose: None }
    }

    pub fn with_face(mut self, face: LandmarkSet) -> Self {
        self.face = Some(face);
        self
    }

    pub fn with_pose(mut self, pose: LandmarkSet) -> Self {
        self.pose = Some(pose);
        self
    }

    /// Reject frames that would poison the stateful pipeline
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if a frame dimension is zero or any
    /// landmark coordinate is not finite.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidInput(format!(
                "Frame dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }

        for (name, set) in [("face", &self.face), ("pose", &self.pose)] {
            if let Some(set) = set {
                if let Some(index) = set.iter().position(|p| !p.is_finite()) {
                    return Err(Error::InvalidInput(format!(
                        "Non-finite {name} landmark at index {index}"
                    )));
                }
            }
        }

        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)] // u64 milliseconds cover any realistic session
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
