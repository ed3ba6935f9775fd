//! Inter-frame motion as a vehicle speed proxy.
//!
//! Features are matched between consecutive grayscale frames and the
//! mean displacement of the best matches is divided by the elapsed time.
//! The result is scaled by a fixed factor and reported in nominal km/h.
//! There is no camera calibration: treat the value as a relative motion
//! signal, not a physical speed.

use super::features::FeatureDetector;
use super::matcher::DescriptorMatcher;
use super::DetectionError;
use crate::capture::Frame;
use std::sync::Arc;

/// Each frame must yield more descriptors than this to be compared.
pub const MIN_DESCRIPTORS: usize = 10;
/// Number of best matches averaged per estimate.
pub const MATCHES_USED: usize = 20;
/// Uncalibrated pixels-per-second to nominal km/h factor.
pub const SPEED_SCALE: f64 = 0.1;

/// Stateful estimator holding the previous grayscale frame.
///
/// The previous frame (and with it the previous timestamp) is replaced
/// on every call, whatever the outcome of the comparison.
pub struct MotionEstimator {
    detector: Arc<dyn FeatureDetector>,
    matcher: Arc<dyn DescriptorMatcher>,
    previous: Option<Frame>,
}

impl MotionEstimator {
    pub fn new(detector: Arc<dyn FeatureDetector>, matcher: Arc<dyn DescriptorMatcher>) -> Self {
        Self {
            detector,
            matcher,
            previous: None,
        }
    }

    /// Estimates speed from the motion between the previous frame and
    /// `frame`.
    ///
    /// Returns `Ok(None)` on the first frame, when either frame lacks
    /// texture, when too few matches survive, or when no time elapsed.
    pub fn estimate(&mut self, frame: &Frame) -> Result<Option<f64>, DetectionError> {
        let current = frame.to_grayscale();
        let Some(previous) = self.previous.take() else {
            self.previous = Some(current);
            return Ok(None);
        };

        let result = self.compare(&previous, &current);
        self.previous = Some(current);
        result
    }

    /// Returns true once a previous frame is held.
    pub fn is_primed(&self) -> bool {
        self.previous.is_some()
    }

    /// Forgets the previous frame.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    fn compare(&self, previous: &Frame, current: &Frame) -> Result<Option<f64>, DetectionError> {
        let elapsed = current
            .timestamp()
            .saturating_duration_since(previous.timestamp())
            .as_secs_f64();
        if elapsed <= 0.0 {
            tracing::trace!(sequence = current.sequence(), "No elapsed time; skipping estimate");
            return Ok(None);
        }

        let before = self.detector.detect_and_describe(previous)?;
        let after = self.detector.detect_and_describe(current)?;
        if before.len() <= MIN_DESCRIPTORS || after.len() <= MIN_DESCRIPTORS {
            tracing::trace!(
                before = before.len(),
                after = after.len(),
                "Insufficient texture; skipping estimate"
            );
            return Ok(None);
        }

        let matches = self
            .matcher
            .match_descriptors(&before.descriptors, &after.descriptors);
        if matches.len() < MATCHES_USED {
            tracing::trace!(matches = matches.len(), "Too few matches; skipping estimate");
            return Ok(None);
        }

        let mut total = 0.0;
        for m in &matches[..MATCHES_USED] {
            let (Some(from), Some(to)) = (before.keypoints.get(m.query), after.keypoints.get(m.train))
            else {
                return Err(DetectionError::Features(format!(
                    "match references missing keypoint ({} -> {})",
                    m.query, m.train
                )));
            };
            total += from.displacement(to);
        }
        let average_displacement = total / MATCHES_USED as f64;
        let speed = average_displacement / elapsed * SPEED_SCALE;

        tracing::debug!(
            average_displacement,
            elapsed_s = elapsed,
            speed,
            "Estimated motion"
        );
        Ok(Some(speed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Camera, CaptureConfig, ColorSpace, SyntheticCamera};
    use crate::detection::features::{BinaryFeatureDetector, Descriptor, Features, Keypoint};
    use crate::detection::matcher::BruteForceMatcher;
    use std::time::{Duration, Instant};

    /// Returns `count` keypoints on a diagonal, shifted by the frame's
    /// first pixel value, with descriptors unique per index.
    struct ShiftingDetector {
        count: usize,
    }

    impl FeatureDetector for ShiftingDetector {
        fn detect_and_describe(&self, frame: &Frame) -> Result<Features, DetectionError> {
            let shift = frame.pixels()[0] as f64;
            let mut features = Features::default();
            for i in 0..self.count {
                features.keypoints.push(Keypoint::new(i as f64 + shift, i as f64));
                let mut bits = [0u8; 32];
                bits[..8].copy_from_slice(&(i as u64).to_le_bytes());
                features.descriptors.push(Descriptor(bits));
            }
            Ok(features)
        }
    }

    fn gray_frame(value: u8, sequence: u64, at: Instant) -> Frame {
        Frame::new(vec![value; 16], 4, 4, ColorSpace::Gray, sequence).with_timestamp(at)
    }

    fn estimator(count: usize) -> MotionEstimator {
        MotionEstimator::new(
            Arc::new(ShiftingDetector { count }),
            Arc::new(BruteForceMatcher::default()),
        )
    }

    #[test]
    fn test_first_frame_returns_none() {
        let mut motion = estimator(40);
        let frame = gray_frame(0, 1, Instant::now());

        assert_eq!(motion.estimate(&frame).unwrap(), None);
        assert!(motion.is_primed());
    }

    #[test]
    fn test_estimate_is_scaled_displacement_rate() {
        let mut motion = estimator(40);
        let t0 = Instant::now();

        motion.estimate(&gray_frame(0, 1, t0)).unwrap();
        let speed = motion
            .estimate(&gray_frame(30, 2, t0 + Duration::from_millis(250)))
            .unwrap()
            .unwrap();

        // 30 px in 0.25 s
        let expected = (30.0 / 0.25) * SPEED_SCALE;
        assert!((speed - expected).abs() < 1e-9, "speed = {speed}");
    }

    #[test]
    fn test_sparse_texture_skips_but_advances() {
        let mut motion = estimator(MIN_DESCRIPTORS);
        let t0 = Instant::now();

        motion.estimate(&gray_frame(0, 1, t0)).unwrap();
        let result = motion
            .estimate(&gray_frame(5, 2, t0 + Duration::from_millis(100)))
            .unwrap();
        assert_eq!(result, None);
        assert_eq!(motion.previous.as_ref().map(Frame::sequence), Some(2));
    }

    #[test]
    fn test_too_few_matches_skips() {
        let mut motion = estimator(MATCHES_USED - 1);
        let t0 = Instant::now();

        motion.estimate(&gray_frame(0, 1, t0)).unwrap();
        let result = motion
            .estimate(&gray_frame(5, 2, t0 + Duration::from_millis(100)))
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_exactly_enough_matches_estimates() {
        let mut motion = estimator(MATCHES_USED);
        let t0 = Instant::now();

        motion.estimate(&gray_frame(0, 1, t0)).unwrap();
        let result = motion
            .estimate(&gray_frame(10, 2, t0 + Duration::from_secs(1)))
            .unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn test_zero_elapsed_time_skips() {
        let mut motion = estimator(40);
        let t0 = Instant::now();

        motion.estimate(&gray_frame(0, 1, t0)).unwrap();
        assert_eq!(motion.estimate(&gray_frame(9, 2, t0)).unwrap(), None);
        assert_eq!(motion.previous.as_ref().map(Frame::sequence), Some(2));
    }

    #[test]
    fn test_estimate_returned_even_when_slow() {
        let mut motion = estimator(40);
        let t0 = Instant::now();

        motion.estimate(&gray_frame(0, 1, t0)).unwrap();
        let speed = motion
            .estimate(&gray_frame(1, 2, t0 + Duration::from_secs(10)))
            .unwrap()
            .unwrap();
        assert!(speed > 0.0 && speed < 1.0);
    }

    #[test]
    fn test_reset_requires_new_prime() {
        let mut motion = estimator(40);
        motion.estimate(&gray_frame(0, 1, Instant::now())).unwrap();
        assert!(motion.is_primed());

        motion.reset();
        assert!(!motion.is_primed());
    }

    #[test]
    fn test_synthetic_drift_measured_with_builtin_detector() {
        let mut config = CaptureConfig::with_dimensions(320, 240);
        config.synthetic_motion_px = 4;
        let mut camera = SyntheticCamera::new();
        camera.open(&config).unwrap();

        let mut motion = MotionEstimator::new(
            Arc::new(BinaryFeatureDetector::new()),
            Arc::new(BruteForceMatcher::default()),
        );
        let t0 = Instant::now();
        let first = camera.capture().unwrap().unwrap().with_timestamp(t0);
        let second = camera
            .capture()
            .unwrap()
            .unwrap()
            .with_timestamp(t0 + Duration::from_secs(1));

        motion.estimate(&first).unwrap();
        let speed = motion.estimate(&second).unwrap().unwrap();

        // 4 px over 1 s
        assert!((speed - 4.0 * SPEED_SCALE).abs() < 1e-6, "speed = {speed}");
    }
}
