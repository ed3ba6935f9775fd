//! Per-frame signal extraction.
//!
//! This module turns frames into the two raw signals the monitors work
//! on: the eye aspect ratio of the driver's face, and a motion-based
//! speed proxy from consecutive frames. The face-mesh model and the
//! feature detector sit behind traits so the backends can be swapped.

mod ear;
mod features;
mod landmarks;
mod matcher;
mod motion;

pub use ear::{average_ear, eye_aspect_ratio, EyeRegion, LEFT_EYE, RIGHT_EYE};
pub use features::{BinaryFeatureDetector, Descriptor, FeatureDetector, Features, Keypoint};
pub use landmarks::{Landmark, LandmarkModel, LandmarkSet, NoLandmarkModel};
pub use matcher::{BruteForceMatcher, DescriptorMatch, DescriptorMatcher};
pub use motion::{MotionEstimator, MATCHES_USED, MIN_DESCRIPTORS, SPEED_SCALE};

use thiserror::Error;

/// Errors raised while extracting signals from one frame.
#[derive(Debug, Clone, Error)]
pub enum DetectionError {
    #[error("landmark extraction failed: {0}")]
    Landmarks(String),
    #[error("feature detection failed: {0}")]
    Features(String),
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
