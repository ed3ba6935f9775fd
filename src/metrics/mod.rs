//! Prometheus metrics for the detection loop.
//!
//! # Metrics Exposed
//!
//! - `driver_safety_detection_active` - Session state (1=active, 0=stopped)
//! - `driver_safety_frames_processed_total` - Frames evaluated
//! - `driver_safety_frames_missed_total` - Cycles without a frame
//! - `driver_safety_cycle_errors_total` - Failed cycles (retried)
//! - `driver_safety_drowsiness_alerts_total` - Drowsiness alerts raised
//! - `driver_safety_speed_alerts_total` - Speed alerts raised
//! - `driver_safety_last_ear` - Latest average EAR
//! - `driver_safety_last_speed_estimate` - Latest speed estimate
//! - `driver_safety_consecutive_closed_frames` - Current closed-eye run
//!
//! The registry is served at `GET /metrics` by the control API.

mod collector;

pub use collector::{MetricsError, MetricsRegistry};
