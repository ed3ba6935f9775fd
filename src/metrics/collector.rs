//! Metrics collection and registry.

use crate::analysis::AlertKind;
use crate::pipeline::CycleReport;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus metrics registry for the detection loop.
pub struct MetricsRegistry {
    registry: Registry,

    // Session
    detection_active: IntGauge,

    // Loop throughput
    frames_processed: IntCounter,
    frames_missed: IntCounter,
    cycle_errors: IntCounter,

    // Alerts
    drowsiness_alerts: IntCounter,
    speed_alerts: IntCounter,

    // Latest signals
    last_ear: Gauge,
    last_speed: Gauge,
    consecutive_closed_frames: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all detection metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let detection_active = IntGauge::new(
            "driver_safety_detection_active",
            "Whether a detection session is running (1=active, 0=stopped)",
        )?;

        let frames_processed = IntCounter::new(
            "driver_safety_frames_processed_total",
            "Frames captured and evaluated by the detection loop",
        )?;
        let frames_missed = IntCounter::new(
            "driver_safety_frames_missed_total",
            "Cycles where the source had no frame available",
        )?;
        let cycle_errors = IntCounter::new(
            "driver_safety_cycle_errors_total",
            "Detection cycles that failed and were retried",
        )?;

        let drowsiness_alerts = IntCounter::new(
            "driver_safety_drowsiness_alerts_total",
            "Drowsiness alerts raised",
        )?;
        let speed_alerts = IntCounter::new(
            "driver_safety_speed_alerts_total",
            "Speed alerts raised",
        )?;

        let last_ear = Gauge::new(
            "driver_safety_last_ear",
            "Most recent average eye aspect ratio",
        )?;
        let last_speed = Gauge::new(
            "driver_safety_last_speed_estimate",
            "Most recent uncalibrated speed estimate",
        )?;
        let consecutive_closed_frames = IntGauge::new(
            "driver_safety_consecutive_closed_frames",
            "Current run of closed-eye frames",
        )?;

        registry.register(Box::new(detection_active.clone()))?;
        registry.register(Box::new(frames_processed.clone()))?;
        registry.register(Box::new(frames_missed.clone()))?;
        registry.register(Box::new(cycle_errors.clone()))?;
        registry.register(Box::new(drowsiness_alerts.clone()))?;
        registry.register(Box::new(speed_alerts.clone()))?;
        registry.register(Box::new(last_ear.clone()))?;
        registry.register(Box::new(last_speed.clone()))?;
        registry.register(Box::new(consecutive_closed_frames.clone()))?;

        Ok(Self {
            registry,
            detection_active,
            frames_processed,
            frames_missed,
            cycle_errors,
            drowsiness_alerts,
            speed_alerts,
            last_ear,
            last_speed,
            consecutive_closed_frames,
        })
    }

    /// Updates metrics from one completed cycle.
    pub fn record_cycle(&self, report: &CycleReport) {
        self.frames_processed.inc();

        // Signals only update when the extractor produced a value.
        if let Some(ear) = report.ear {
            self.last_ear.set(ear);
        }
        if let Some(speed) = report.speed {
            self.last_speed.set(speed);
        }
        self.consecutive_closed_frames
            .set(report.consecutive_closed_frames as i64);

        for alert in &report.alerts {
            match alert.kind {
                AlertKind::Drowsiness => self.drowsiness_alerts.inc(),
                AlertKind::Speed => self.speed_alerts.inc(),
            }
        }
    }

    pub fn record_missed_frame(&self) {
        self.frames_missed.inc();
    }

    pub fn record_cycle_error(&self) {
        self.cycle_errors.inc();
    }

    pub fn set_active(&self, active: bool) {
        self.detection_active.set(if active { 1 } else { 0 });
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
