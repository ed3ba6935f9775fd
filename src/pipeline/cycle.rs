//! One detection cycle: capture, extract, debounce.

use crate::analysis::{Alert, DrowsinessMonitor, SpeedMonitor, Thresholds};
use crate::capture::{BoxedCamera, CameraError, Frame};
use crate::detection::{
    average_ear, BinaryFeatureDetector, BruteForceMatcher, DescriptorMatcher, DetectionError,
    FeatureDetector, LandmarkModel, MotionEstimator, NoLandmarkModel,
};
use std::sync::Arc;
use thiserror::Error;

/// Failure of a single cycle. The loop logs it and carries on.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("frame acquisition failed: {0}")]
    Capture(#[from] CameraError),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error("detection worker failed: {0}")]
    Worker(String),
}

/// External models the pipeline calls into.
#[derive(Clone)]
pub struct Collaborators {
    pub landmarks: Arc<dyn LandmarkModel>,
    pub features: Arc<dyn FeatureDetector>,
    pub matcher: Arc<dyn DescriptorMatcher>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            landmarks: Arc::new(NoLandmarkModel),
            features: Arc::new(BinaryFeatureDetector::new()),
            matcher: Arc::new(BruteForceMatcher::default()),
        }
    }
}

/// What one evaluated frame produced.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub frame: Arc<Frame>,
    /// Average EAR of the first face, if one was usable.
    pub ear: Option<f64>,
    /// Speed estimate, if the motion estimator produced one.
    pub speed: Option<f64>,
    pub consecutive_closed_frames: u32,
    /// Alerts in the order they were raised: drowsiness, then speed.
    pub alerts: Vec<Alert>,
}

/// Per-session detection state: the open source plus fresh monitors.
pub struct DetectionPipeline {
    camera: Option<BoxedCamera>,
    landmarks: Arc<dyn LandmarkModel>,
    drowsiness: DrowsinessMonitor,
    motion: MotionEstimator,
    speed: SpeedMonitor,
}

impl DetectionPipeline {
    pub fn new(
        camera: Option<BoxedCamera>,
        collaborators: &Collaborators,
        thresholds: Thresholds,
        closed_frame_trigger: u32,
    ) -> Self {
        Self {
            camera,
            landmarks: Arc::clone(&collaborators.landmarks),
            drowsiness: DrowsinessMonitor::with_trigger(thresholds.drowsiness, closed_frame_trigger),
            motion: MotionEstimator::new(
                Arc::clone(&collaborators.features),
                Arc::clone(&collaborators.matcher),
            ),
            speed: SpeedMonitor::new(thresholds.speed),
        }
    }

    pub fn has_source(&self) -> bool {
        self.camera.is_some()
    }

    pub fn is_source_open(&self) -> bool {
        self.camera.as_ref().is_some_and(|camera| camera.is_open())
    }

    /// Reads the next frame from the source.
    pub fn capture(&mut self) -> Result<Option<Frame>, CameraError> {
        match self.camera.as_mut() {
            Some(camera) => camera.capture(),
            None => Ok(None),
        }
    }

    /// Runs both extractors and monitors on `frame`.
    pub fn evaluate(
        &mut self,
        frame: Arc<Frame>,
        thresholds: Thresholds,
    ) -> Result<CycleReport, DetectionError> {
        self.drowsiness.set_threshold(thresholds.drowsiness);
        self.speed.set_threshold(thresholds.speed);

        let mut alerts = Vec::new();

        let faces = self.landmarks.extract(&frame)?;
        let ear = faces.first().and_then(average_ear);
        if let Some(ear) = ear {
            alerts.extend(self.drowsiness.observe(ear));
        }

        let speed = self.motion.estimate(&frame)?;
        if let Some(speed) = speed {
            alerts.extend(self.speed.observe(speed));
        }

        Ok(CycleReport {
            frame,
            ear,
            speed,
            consecutive_closed_frames: self.drowsiness.consecutive_closed_frames(),
            alerts,
        })
    }

    /// Closes and drops the source. Later cycles see no source.
    pub fn release(&mut self) -> Result<(), CameraError> {
        match self.camera.take() {
            Some(mut camera) => camera.close(),
            None => Ok(()),
        }
    }
}
