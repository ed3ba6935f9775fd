//! Keypoint detection and binary descriptors.
//!
//! The motion estimator only needs a detector that returns keypoints
//! with comparable descriptors. [`BinaryFeatureDetector`] is the
//! built-in implementation: corner-like points picked per grid cell,
//! described by 256 intensity comparisons around each point.

use super::DetectionError;
use crate::capture::Frame;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};

/// A keypoint location in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
}

impl Keypoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean pixel distance to another keypoint.
    #[inline]
    pub fn displacement(&self, other: &Keypoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// 256-bit binary descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor(pub [u8; 32]);

impl Descriptor {
    /// Number of differing bits.
    #[inline]
    pub fn hamming(&self, other: &Descriptor) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// Keypoints and their descriptors, index-aligned.
#[derive(Debug, Clone, Default)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Detects and describes keypoints on a grayscale frame.
pub trait FeatureDetector: Send + Sync {
    fn detect_and_describe(&self, frame: &Frame) -> Result<Features, DetectionError>;
}

/// Half-width of the descriptor sampling patch.
const PATCH_RADIUS: i64 = 15;
const DESCRIPTOR_BITS: usize = 256;
const PATTERN_SEED: u64 = 0x0b5e_55ed;

/// Grid-based corner detector with comparison descriptors.
#[derive(Debug, Clone)]
pub struct BinaryFeatureDetector {
    /// Side length of the selection grid, in pixels.
    cell_size: u32,
    /// Minimum corner score for a candidate.
    min_score: u32,
    /// Upper bound on returned keypoints (strongest kept).
    max_features: usize,
    /// Sampling pairs `(dx1, dy1, dx2, dy2)` around the keypoint.
    pattern: Vec<[i64; 4]>,
}

impl BinaryFeatureDetector {
    pub fn new() -> Self {
        Self::with_params(8, 10, 500)
    }

    /// Creates a detector with custom grid size, score floor and cap.
    pub fn with_params(cell_size: u32, min_score: u32, max_features: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(PATTERN_SEED);
        let span = (2 * PATCH_RADIUS + 1) as u32;
        let mut offset = || (rng.next_u32() % span) as i64 - PATCH_RADIUS;
        let pattern = (0..DESCRIPTOR_BITS)
            .map(|_| [offset(), offset(), offset(), offset()])
            .collect();

        Self {
            cell_size: cell_size.max(1),
            min_score,
            max_features,
            pattern,
        }
    }

    /// Corner score: the weaker of the two central gradients.
    ///
    /// Edges score low because only one direction changes.
    fn score(frame: &Frame, x: i64, y: i64) -> Option<u32> {
        let gx = frame.luma(x + 1, y)? as i32 - frame.luma(x - 1, y)? as i32;
        let gy = frame.luma(x, y + 1)? as i32 - frame.luma(x, y - 1)? as i32;
        Some(gx.unsigned_abs().min(gy.unsigned_abs()))
    }

    fn describe(&self, frame: &Frame, x: i64, y: i64) -> Option<Descriptor> {
        let mut bits = [0u8; 32];
        for (i, [dx1, dy1, dx2, dy2]) in self.pattern.iter().enumerate() {
            let a = frame.luma(x + dx1, y + dy1)?;
            let b = frame.luma(x + dx2, y + dy2)?;
            if a < b {
                bits[i / 8] |= 1 << (i % 8);
            }
        }
        Some(Descriptor(bits))
    }
}

impl Default for BinaryFeatureDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureDetector for BinaryFeatureDetector {
    fn detect_and_describe(&self, frame: &Frame) -> Result<Features, DetectionError> {
        if !frame.is_valid() {
            return Err(DetectionError::InvalidFrame(format!("{frame:?}")));
        }
        let gray;
        let frame = if frame.color() == crate::capture::ColorSpace::Gray {
            frame
        } else {
            gray = frame.to_grayscale();
            &gray
        };

        let (width, height) = (frame.width() as i64, frame.height() as i64);
        let margin = PATCH_RADIUS + 1;
        if width <= 2 * margin || height <= 2 * margin {
            return Ok(Features::default());
        }

        let cell = self.cell_size as i64;
        let mut candidates: Vec<(u32, i64, i64)> = Vec::new();
        let mut cy = margin;
        while cy < height - margin {
            let mut cx = margin;
            while cx < width - margin {
                let mut best: Option<(u32, i64, i64)> = None;
                for y in cy..(cy + cell).min(height - margin) {
                    for x in cx..(cx + cell).min(width - margin) {
                        let Some(score) = Self::score(frame, x, y) else {
                            continue;
                        };
                        if score >= self.min_score && best.map_or(true, |(s, _, _)| score > s) {
                            best = Some((score, x, y));
                        }
                    }
                }
                candidates.extend(best);
                cx += cell;
            }
            cy += cell;
        }

        // Strongest first; position breaks ties so the order is stable.
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then(a.2.cmp(&b.2)).then(a.1.cmp(&b.1)));
        candidates.truncate(self.max_features);

        let mut features = Features::default();
        for (_, x, y) in candidates {
            if let Some(descriptor) = self.describe(frame, x, y) {
                features.keypoints.push(Keypoint::new(x as f64, y as f64));
                features.descriptors.push(descriptor);
            }
        }

        tracing::trace!(
            sequence = frame.sequence(),
            keypoints = features.len(),
            "Detected features"
        );
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Camera, CaptureConfig, ColorSpace, SyntheticCamera};

    fn synthetic_frame() -> Frame {
        let mut camera = SyntheticCamera::new();
        camera.open(&CaptureConfig::with_dimensions(160, 120)).unwrap();
        camera.capture().unwrap().unwrap()
    }

    #[test]
    fn test_hamming_distance() {
        let a = Descriptor([0u8; 32]);
        let mut bits = [0u8; 32];
        bits[0] = 0b1011;
        bits[31] = 0x80;
        let b = Descriptor(bits);

        assert_eq!(a.hamming(&a), 0);
        assert_eq!(a.hamming(&b), 4);
    }

    #[test]
    fn test_flat_frame_has_no_features() {
        let frame = Frame::new(vec![128u8; 100 * 100], 100, 100, ColorSpace::Gray, 1);
        let features = BinaryFeatureDetector::new()
            .detect_and_describe(&frame)
            .unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn test_textured_frame_has_features_away_from_border() {
        let frame = synthetic_frame();
        let features = BinaryFeatureDetector::new()
            .detect_and_describe(&frame)
            .unwrap();

        assert!(features.len() > 10);
        assert_eq!(features.keypoints.len(), features.descriptors.len());
        for kp in &features.keypoints {
            assert!(kp.x > PATCH_RADIUS as f64 && kp.x < 160.0 - PATCH_RADIUS as f64);
            assert!(kp.y > PATCH_RADIUS as f64 && kp.y < 120.0 - PATCH_RADIUS as f64);
        }
    }

    #[test]
    fn test_detection_is_deterministic() {
        let frame = synthetic_frame();
        let detector = BinaryFeatureDetector::new();

        let a = detector.detect_and_describe(&frame).unwrap();
        let b = BinaryFeatureDetector::new().detect_and_describe(&frame).unwrap();
        assert_eq!(a.keypoints, b.keypoints);
        assert_eq!(a.descriptors, b.descriptors);
    }

    #[test]
    fn test_invalid_frame_rejected() {
        let frame = Frame::new(vec![0u8; 10], 100, 100, ColorSpace::Gray, 1);
        assert!(matches!(
            BinaryFeatureDetector::new().detect_and_describe(&frame),
            Err(DetectionError::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_cap_limits_feature_count() {
        let frame = synthetic_frame();
        let detector = BinaryFeatureDetector::with_params(8, 10, 12);
        let features = detector.detect_and_describe(&frame).unwrap();
        assert!(features.len() <= 12);
    }
}
