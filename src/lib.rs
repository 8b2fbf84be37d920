//! Posture monitoring library for webcam-based sitting posture feedback.
//!
//! This library turns per-frame face and body landmarks into a stable
//! good/bad posture verdict:
//! - Head pitch, yaw and roll from a perspective solve against a 3D face model
//! - Camera distance from the pupil separation
//! - Shoulder tilt from the body pose landmarks
//!
//! The classification pipeline consists of:
//! 1. Feature extraction from the landmark sets
//! 2. Median smoothing of each metric
//! 3. Hysteresis thresholds relative to a calibrated baseline, plus detection
//!    of a body lean masked by an opposite head tilt
//! 4. Frame-count debouncing of the raw verdict
//! 5. Session timing, warning cadence and statistics
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use posture_monitor::{config::Config, landmarks::FrameInput, monitor::PostureMonitor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut monitor = PostureMonitor::from_config(&Config::default())?;
//!
//! // Frames come from an external face/pose landmark detector
//! let frames: Vec<FrameInput> = Vec::new();
//!
//! if let Some(first) = frames.first() {
//!     let calibration = monitor.calibrate(first)?;
//!     println!("Calibrated: {}", calibration.success);
//! }
//!
//! for frame in &frames {
//!     let result = monitor.classify(frame)?;
//!     if let Some(warning) = &result.warning {
//!         println!("{}", warning);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Async Service
//!
//! ```no_run
//! use posture_monitor::{monitor::PostureMonitor, service::PostureService};
//!
//! # async fn run() -> posture_monitor::Result<()> {
//! let handle = PostureService::spawn(PostureMonitor::new());
//! let mut results = handle.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(result) = results.recv().await {
//!         println!("bad posture: {}", result.is_bad);
//!     }
//! });
//!
//! let statistics = handle.shutdown().await?;
//! println!("Total bad time: {:.1}s", statistics.total_bad_duration);
//! # Ok(())
//! # }
//! ```

/// Constants used throughout the library
pub mod constants;

/// Error types and result handling
pub mod error;

/// Landmark and frame input types
pub mod landmarks;

/// Utility functions for geometry and numeric conversions
pub mod utils;

/// Perspective-n-Point solvers
pub mod solver;

/// Head pose estimation from face landmarks
pub mod pose_estimation;

/// Per-frame posture feature extraction
pub mod features;

/// Median smoothing of posture metrics
pub mod filters;

/// Hysteresis thresholds and sensitivity scaling
pub mod thresholds;

/// Good/bad state debouncing
pub mod debouncer;

/// Body lean compensation detection
pub mod compensation;

/// Calibrated baseline posture
pub mod baseline;

/// Raw per-frame posture classification
pub mod classifier;

/// Bad posture session tracking and warnings
pub mod session;

/// Stateful classification session
pub mod monitor;

/// Async classification service
pub mod service;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
