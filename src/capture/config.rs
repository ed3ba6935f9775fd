//! Camera capture configuration and source descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest accepted frame side, in pixels.
pub const MAX_DIMENSION: u32 = 8192;

/// Configuration used when opening an acquisition source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target frames per second requested from the device.
    pub fps: u32,
    /// Horizontal drift of the synthetic camera, in pixels per frame.
    pub synthetic_motion_px: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
            synthetic_motion_px: 4,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), CaptureConfigError> {
        let side_ok = |side: u32| (1..=MAX_DIMENSION).contains(&side);
        if !side_ok(self.width) || !side_ok(self.height) {
            return Err(CaptureConfigError::InvalidDimensions);
        }
        if self.fps == 0 || self.fps > 120 {
            return Err(CaptureConfigError::InvalidFrameRate);
        }
        Ok(())
    }
}

/// Capture configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureConfigError {
    #[error("invalid frame dimensions (each side must be 1-8192 px)")]
    InvalidDimensions,
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
}

/// Identifies which acquisition source a session should open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceDescriptor {
    /// Local capture device by index.
    Device { index: u32 },
    /// Network or file video source (IP camera app, RTSP, recorded clip).
    Stream { url: String },
    /// Built-in generated texture drifting at a fixed rate.
    Synthetic,
}

impl SourceDescriptor {
    /// Builds a descriptor from the control surface's `camera_type` and
    /// `camera_url` pair.
    ///
    /// `phone` selects local device 0; `device` parses the index from the
    /// url (default 0); `synthetic` ignores the url. Any other type opens
    /// `camera_url` as a video stream, which must then be non-empty.
    pub fn from_request(camera_type: &str, camera_url: &str) -> Result<Self, UnsupportedSource> {
        let url = camera_url.trim();
        match camera_type.trim().to_ascii_lowercase().as_str() {
            "phone" => Ok(SourceDescriptor::Device { index: 0 }),
            "device" => Ok(SourceDescriptor::Device {
                index: url.parse::<u32>().unwrap_or(0),
            }),
            "synthetic" => Ok(SourceDescriptor::Synthetic),
            _ if url.is_empty() => Err(UnsupportedSource(format!(
                "{camera_type} source requires a camera_url"
            ))),
            _ => Ok(SourceDescriptor::Stream { url: url.to_string() }),
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDescriptor::Device { index } => write!(f, "device:{index}"),
            SourceDescriptor::Stream { url } => write!(f, "stream:{url}"),
            SourceDescriptor::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Source kinds this build cannot open.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported acquisition source: {0}")]
pub struct UnsupportedSource(pub String);
