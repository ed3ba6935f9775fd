//! The background detection loop.

use super::{CycleError, CycleReport, DetectionPipeline, Slot};
use crate::analysis::{Alert, LiveThresholds};
use crate::capture::Frame;
use crate::metrics::MetricsRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Loop pacing.
#[derive(Debug, Clone, Copy)]
pub struct LoopTiming {
    /// Pause after a processed (or empty) cycle.
    pub cycle_interval: Duration,
    /// Pause while no source is attached.
    pub no_source_interval: Duration,
    /// Pause after a failed cycle.
    pub error_backoff: Duration,
}

/// Everything one loop run shares with the session.
#[derive(Clone)]
pub struct LoopContext {
    pub pipeline: Arc<Mutex<DetectionPipeline>>,
    pub frames: Arc<Slot<Arc<Frame>>>,
    pub alerts: Arc<Slot<Alert>>,
    pub thresholds: Arc<LiveThresholds>,
    /// Whether the source was open as of the latest cycle.
    pub source_open: Arc<AtomicBool>,
    pub metrics: Option<Arc<MetricsRegistry>>,
    pub timing: LoopTiming,
}

/// Result of a successful cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Processed(CycleReport),
    /// The source was attached but had nothing to read.
    NoFrame,
    NoSource,
}

/// Runs one cycle synchronously: capture, publish, evaluate, publish alerts.
pub fn run_cycle(ctx: &LoopContext) -> Result<CycleOutcome, CycleError> {
    let mut pipeline = ctx.pipeline.lock().unwrap_or_else(PoisonError::into_inner);
    ctx.source_open.store(pipeline.is_source_open(), Ordering::SeqCst);
    if !pipeline.has_source() {
        return Ok(CycleOutcome::NoSource);
    }

    let Some(frame) = pipeline.capture()? else {
        return Ok(CycleOutcome::NoFrame);
    };
    let frame = Arc::new(frame);
    ctx.frames.publish(Arc::clone(&frame));

    let report = pipeline.evaluate(frame, ctx.thresholds.get())?;
    for alert in &report.alerts {
        info!(
            kind = %alert.kind,
            confidence = alert.confidence,
            metric = alert.metric,
            "{}",
            alert.message
        );
        ctx.alerts.publish(alert.clone());
    }
    Ok(CycleOutcome::Processed(report))
}

/// Repeats cycles until `running` turns false or its sender is dropped.
///
/// Blocking capture and inference run on the blocking pool; a failed
/// cycle is logged and retried after the error backoff.
pub async fn run_detection_loop(ctx: LoopContext, mut running: watch::Receiver<bool>) {
    info!("Detection loop started");

    loop {
        if !*running.borrow_and_update() {
            break;
        }

        let cycle_ctx = ctx.clone();
        let result = tokio::task::spawn_blocking(move || run_cycle(&cycle_ctx))
            .await
            .map_err(|e| CycleError::Worker(e.to_string()))
            .and_then(|outcome| outcome);

        let pause = match result {
            Ok(CycleOutcome::Processed(report)) => {
                if let Some(metrics) = &ctx.metrics {
                    metrics.record_cycle(&report);
                }
                debug!(
                    sequence = report.frame.sequence(),
                    ear = ?report.ear,
                    speed = ?report.speed,
                    closed_frames = report.consecutive_closed_frames,
                    "Cycle complete"
                );
                ctx.timing.cycle_interval
            }
            Ok(CycleOutcome::NoFrame) => {
                if let Some(metrics) = &ctx.metrics {
                    metrics.record_missed_frame();
                }
                ctx.timing.cycle_interval
            }
            Ok(CycleOutcome::NoSource) => ctx.timing.no_source_interval,
            Err(e) => {
                if let Some(metrics) = &ctx.metrics {
                    metrics.record_cycle_error();
                }
                error!(error = %e, "Detection cycle failed");
                ctx.timing.error_backoff
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            changed = running.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!("Detection loop stopped");
}
