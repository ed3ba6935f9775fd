//! Detection session lifecycle.
//!
//! A [`Session`] owns at most one running detection loop. `start` opens
//! the requested source and spawns the loop; `stop` signals it, waits a
//! bounded time, releases the source and then clears published state.
//! The alert and frame slots outlive individual runs so the control
//! surface can hold a single handle.

use super::stream::mjpeg_stream;
use super::worker::{run_detection_loop, LoopContext, LoopTiming};
use super::{Collaborators, DetectionPipeline, Slot};
use crate::analysis::{Alert, InvalidThresholds, LiveThresholds, Thresholds};
use crate::capture::{open_source, BoxedCamera, CameraError, CaptureConfig, Frame, SourceDescriptor};
use crate::config::{DetectionConfig, FileConfig, StreamConfig};
use crate::metrics::MetricsRegistry;
use futures::Stream;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Session operation errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("detection is not active")]
    NotActive,
    #[error("failed to open source: {0}")]
    Source(#[from] CameraError),
    #[error(transparent)]
    InvalidThresholds(#[from] InvalidThresholds),
}

/// What `start` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A loop was already running; nothing changed.
    AlreadyActive,
}

/// Snapshot reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub detection_active: bool,
    pub camera_connected: bool,
    pub drowsiness_threshold: f64,
    pub speed_threshold: f64,
}

struct Worker {
    handle: JoinHandle<()>,
    pipeline: Arc<Mutex<DetectionPipeline>>,
    running: watch::Sender<bool>,
}

/// Owns the detection loop and the state it publishes.
pub struct Session {
    detection: DetectionConfig,
    capture: CaptureConfig,
    stream: StreamConfig,
    collaborators: Collaborators,
    frames: Arc<Slot<Arc<Frame>>>,
    alerts: Arc<Slot<Alert>>,
    thresholds: Arc<LiveThresholds>,
    metrics: Option<Arc<MetricsRegistry>>,
    active: AtomicBool,
    source_open: Arc<AtomicBool>,
    worker: tokio::sync::Mutex<Option<Worker>>,
}

impl Session {
    pub fn new(config: &FileConfig) -> Self {
        Self {
            detection: config.detection.clone(),
            capture: config.capture.clone(),
            stream: config.stream.clone(),
            collaborators: Collaborators::default(),
            frames: Arc::new(Slot::new()),
            alerts: Arc::new(Slot::new()),
            thresholds: Arc::new(LiveThresholds::new(config.detection.thresholds())),
            metrics: None,
            active: AtomicBool::new(false),
            source_open: Arc::new(AtomicBool::new(false)),
            worker: tokio::sync::Mutex::new(None),
        }
    }

    /// Replaces the landmark, feature and matcher implementations used by
    /// future runs.
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        metrics.set_active(false);
        self.metrics = Some(metrics);
        self
    }

    /// Opens `source` and starts the loop.
    ///
    /// Returns [`StartOutcome::AlreadyActive`] without touching the
    /// running loop when one exists.
    pub async fn start(&self, source: &SourceDescriptor) -> Result<StartOutcome, SessionError> {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            return Ok(StartOutcome::AlreadyActive);
        }

        let descriptor = source.clone();
        let capture = self.capture.clone();
        let camera = tokio::task::spawn_blocking(move || open_source(&descriptor, &capture))
            .await
            .map_err(|e| CameraError::OpenFailed(e.to_string()))??;

        info!(%source, "Source opened");
        *worker = Some(self.spawn(camera));
        Ok(StartOutcome::Started)
    }

    /// Starts the loop on an already opened source.
    pub async fn start_with_camera(&self, camera: BoxedCamera) -> StartOutcome {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            return StartOutcome::AlreadyActive;
        }
        *worker = Some(self.spawn(camera));
        StartOutcome::Started
    }

    fn spawn(&self, camera: BoxedCamera) -> Worker {
        // Fresh monitors every run: counters and the previous frame never
        // carry over from an earlier session.
        let pipeline = Arc::new(Mutex::new(DetectionPipeline::new(
            Some(camera),
            &self.collaborators,
            self.thresholds.get(),
            self.detection.closed_frame_trigger,
        )));
        let (running, running_rx) = watch::channel(true);
        self.alerts.clear();
        self.source_open.store(true, Ordering::SeqCst);

        let ctx = LoopContext {
            pipeline: Arc::clone(&pipeline),
            frames: Arc::clone(&self.frames),
            alerts: Arc::clone(&self.alerts),
            thresholds: Arc::clone(&self.thresholds),
            source_open: Arc::clone(&self.source_open),
            metrics: self.metrics.clone(),
            timing: LoopTiming {
                cycle_interval: self.detection.cycle_interval(),
                no_source_interval: self.detection.no_source_interval(),
                error_backoff: self.detection.error_backoff(),
            },
        };
        let handle = tokio::spawn(run_detection_loop(ctx, running_rx));

        self.active.store(true, Ordering::SeqCst);
        if let Some(metrics) = &self.metrics {
            metrics.set_active(true);
        }
        info!("Detection started");

        Worker {
            handle,
            pipeline,
            running,
        }
    }

    /// Stops the loop and releases the source. Safe to call repeatedly.
    ///
    /// Joining the loop and releasing the source share one
    /// `stop_timeout` budget. Published state is cleared only after both,
    /// so nothing from the final cycle outlives the call.
    pub async fn stop(&self) {
        let mut worker = self.worker.lock().await;
        self.active.store(false, Ordering::SeqCst);

        if let Some(Worker {
            mut handle,
            pipeline,
            running,
        }) = worker.take()
        {
            running.send_replace(false);

            let timeout = self.detection.stop_timeout();
            let deadline = tokio::time::Instant::now() + timeout;
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Detection loop ended abnormally"),
                Err(_) => {
                    warn!(?timeout, "Detection loop did not stop in time, aborting");
                    handle.abort();
                }
            }

            let released = tokio::task::spawn_blocking(move || release(&pipeline));
            match tokio::time::timeout_at(deadline, released).await {
                Ok(Ok(Ok(()))) => info!("Source released"),
                Ok(Ok(Err(e))) => warn!(error = %e, "Failed to release source"),
                Ok(Err(e)) => warn!(error = %e, "Source release task failed"),
                Err(_) => warn!(?timeout, "Source release still running after stop timeout"),
            }
        }

        self.source_open.store(false, Ordering::SeqCst);
        self.alerts.clear();
        self.frames.clear();
        if let Some(metrics) = &self.metrics {
            metrics.set_active(false);
        }
        info!("Detection stopped");
    }

    /// Validates and installs new thresholds. The running loop picks them
    /// up on its next cycle.
    pub fn update_thresholds(&self, drowsiness: f64, speed: f64) -> Result<Thresholds, SessionError> {
        let thresholds = Thresholds::new(drowsiness, speed);
        self.thresholds.set(thresholds)?;
        Ok(thresholds)
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds.get()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> SessionStatus {
        let thresholds = self.thresholds.get();
        SessionStatus {
            detection_active: self.is_active(),
            camera_connected: self.is_active() && self.source_open.load(Ordering::SeqCst),
            drowsiness_threshold: thresholds.drowsiness,
            speed_threshold: thresholds.speed,
        }
    }

    /// Removes and returns the latest alert.
    pub fn take_alert(&self) -> Option<Alert> {
        self.alerts.take()
    }

    pub fn latest_frame(&self) -> Option<Arc<Frame>> {
        self.frames.peek()
    }

    /// Opens an MJPEG stream of the latest frame for the current run.
    ///
    /// The stream ends when the run is stopped.
    pub async fn frame_stream(
        &self,
    ) -> Result<impl Stream<Item = Result<Vec<u8>, Infallible>> + Send + 'static, SessionError> {
        let worker = self.worker.lock().await;
        let running = match worker.as_ref() {
            Some(worker) if self.is_active() => worker.running.subscribe(),
            _ => return Err(SessionError::NotActive),
        };

        Ok(mjpeg_stream(
            Arc::clone(&self.frames),
            running,
            self.stream.frame_interval(),
            self.stream.jpeg_quality,
        ))
    }
}

/// Closes the run's source. A loop that could not be stopped may still
/// hold the pipeline; in that case the source is left to its owner.
fn release(pipeline: &Mutex<DetectionPipeline>) -> Result<(), CameraError> {
    match pipeline.try_lock() {
        Ok(mut pipeline) => pipeline.release(),
        Err(std::sync::TryLockError::Poisoned(poisoned)) => {
            PoisonError::into_inner(poisoned).release()
        }
        Err(std::sync::TryLockError::WouldBlock) => Err(CameraError::ReleaseFailed(
            "pipeline still in use by detection loop".into(),
        )),
    }
}
