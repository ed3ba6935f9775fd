//! Camera abstraction for frame capture.
//!
//! This module provides a trait-based abstraction over acquisition
//! sources, allowing for both real camera input and generated frames
//! for testing and demos.

use super::{CaptureConfig, ColorSpace, Frame, SourceDescriptor};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    #[error("failed to release camera: {0}")]
    ReleaseFailed(String),
    #[error("camera not initialized")]
    NotInitialized,
    #[error(transparent)]
    Unsupported(#[from] super::UnsupportedSource),
}

/// Trait for acquisition sources.
///
/// `capture` returning `Ok(None)` means no frame is available right now;
/// the caller should retry on its next cycle. Implementations must bound
/// any blocking read so a stopping session is never held up indefinitely.
pub trait Camera {
    /// Opens and initializes the camera with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Captures a single frame, if one is available.
    fn capture(&mut self) -> Result<Option<Frame>, CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self) -> Result<(), CameraError>;
}

/// An opened source that can be moved onto the detection worker.
pub type BoxedCamera = Box<dyn Camera + Send>;

/// Opens the source named by `descriptor`.
///
/// Failures here are configuration errors: the caller's session must
/// stay stopped.
pub fn open_source(
    descriptor: &SourceDescriptor,
    config: &CaptureConfig,
) -> Result<BoxedCamera, CameraError> {
    let mut camera: BoxedCamera = match descriptor {
        SourceDescriptor::Synthetic => Box::new(SyntheticCamera::new()),
        #[cfg(feature = "camera")]
        SourceDescriptor::Device { index } => Box::new(super::DeviceCamera::new(*index)),
        #[cfg(not(feature = "camera"))]
        SourceDescriptor::Device { index } => {
            return Err(CameraError::DeviceNotFound(format!(
                "device {index} (built without the `camera` feature)"
            )))
        }
        #[cfg(feature = "stream")]
        SourceDescriptor::Stream { url } => Box::new(super::StreamCamera::new(url.clone())),
        #[cfg(not(feature = "stream"))]
        SourceDescriptor::Stream { url } => {
            return Err(CameraError::Unsupported(super::UnsupportedSource(format!(
                "stream {url} (built without the `stream` feature)"
            ))))
        }
    };
    camera.open(config)?;
    Ok(camera)
}

/// Side length of one texture block in the synthetic pattern.
const SYNTHETIC_BLOCK: i64 = 8;

/// Camera producing a textured pattern that drifts horizontally.
///
/// Every frame is an exact translation of the previous one by
/// `synthetic_motion_px`, so matched features move by a known amount.
#[derive(Debug, Default)]
pub struct SyntheticCamera {
    config: Option<CaptureConfig>,
    sequence: u64,
}

impl SyntheticCamera {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(config: &CaptureConfig, offset: i64) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(config.width as usize * config.height as usize * 3);
        for y in 0..config.height as i64 {
            for x in 0..config.width as i64 {
                let value = block_intensity(
                    (x + offset).div_euclid(SYNTHETIC_BLOCK),
                    y.div_euclid(SYNTHETIC_BLOCK),
                );
                pixels.extend_from_slice(&[value, value, value]);
            }
        }
        pixels
    }
}

/// Deterministic pseudo-random intensity for a texture block.
fn block_intensity(bx: i64, by: i64) -> u8 {
    let mut h = (bx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (by as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    h ^= h >> 29;
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^= h >> 32;
    (h & 0xFF) as u8
}

impl Camera for SyntheticCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(
            width = config.width,
            height = config.height,
            motion_px = config.synthetic_motion_px,
            "Synthetic camera opened"
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<Option<Frame>, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;

        let offset = self.sequence as i64 * config.synthetic_motion_px as i64;
        let pixels = Self::render(config, offset);

        self.sequence += 1;
        Ok(Some(Frame::new(
            pixels,
            config.width,
            config.height,
            ColorSpace::Rgb,
            self.sequence,
        )))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) -> Result<(), CameraError> {
        self.config = None;
        tracing::info!("Synthetic camera closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> CaptureConfig {
        CaptureConfig::with_dimensions(64, 48)
    }

    #[test]
    fn test_synthetic_camera_lifecycle() {
        let mut camera = SyntheticCamera::new();

        assert!(!camera.is_open());

        camera.open(&small_config()).unwrap();
        assert!(camera.is_open());

        let frame = camera.capture().unwrap().unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.sequence(), 1);

        let frame2 = camera.capture().unwrap().unwrap();
        assert_eq!(frame2.sequence(), 2);

        camera.close().unwrap();
        assert!(!camera.is_open());
    }

    #[test]
    fn test_capture_without_open() {
        let mut camera = SyntheticCamera::new();
        assert!(matches!(
            camera.capture(),
            Err(CameraError::NotInitialized)
        ));
    }

    #[test]
    fn test_frames_are_translated_copies() {
        let mut config = small_config();
        config.synthetic_motion_px = 3;
        let mut camera = SyntheticCamera::new();
        camera.open(&config).unwrap();

        let first = camera.capture().unwrap().unwrap().to_grayscale();
        let second = camera.capture().unwrap().unwrap().to_grayscale();

        // Content at x + 3 in the first frame shows up at x in the second.
        for y in 0..48 {
            for x in 0..40 {
                assert_eq!(second.luma(x, y), first.luma(x + 3, y));
            }
        }
    }

    #[test]
    fn test_open_synthetic_source() {
        let camera = open_source(&SourceDescriptor::Synthetic, &small_config()).unwrap();
        assert!(camera.is_open());
    }

    #[cfg(not(feature = "camera"))]
    #[test]
    fn test_device_unavailable_without_feature() {
        let result = open_source(&SourceDescriptor::Device { index: 0 }, &small_config());
        assert!(matches!(result, Err(CameraError::DeviceNotFound(_))));
    }

    #[cfg(not(feature = "stream"))]
    #[test]
    fn test_stream_unsupported_without_feature() {
        let source = SourceDescriptor::Stream {
            url: "rtsp://10.0.0.2/live".into(),
        };
        let result = open_source(&source, &small_config());
        assert!(matches!(result, Err(CameraError::Unsupported(_))));
    }

    #[test]
    fn test_synthetic_rejects_oversized_config() {
        let mut camera = SyntheticCamera::new();
        let result = camera.open(&CaptureConfig::with_dimensions(u32::MAX, u32::MAX));
        assert!(matches!(result, Err(CameraError::ConfigFailed(_))));
    }
}
