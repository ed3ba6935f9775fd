//! Driver Safety Detection Library
//!
//! Watches a driver-facing camera for two hazards: sustained eye closure
//! (drowsiness) and excessive apparent motion (a relative speed proxy).
//! Alerts, status and a live MJPEG feed are served over HTTP.
//!
//! # Architecture
//!
//! ```text
//! capture → detection → analysis → pipeline → api
//!                                      ↓
//!                                   metrics
//! ```
//!
//! - `capture`: acquisition sources and frames
//! - `detection`: eye aspect ratio and motion estimation
//! - `analysis`: threshold monitors and alerts
//! - `pipeline`: the detection loop, session lifecycle, frame streaming
//! - `api`: the HTTP control surface
//!
//! # Design Principles
//!
//! - **Latest value wins**: alerts and frames are single-slot, never queued
//! - **Loop never dies on a bad frame**: cycle failures are logged and retried
//! - **Bounded stop**: stopping waits a fixed time for the loop, then aborts it
//! - **Uncalibrated speed**: the motion estimate is relative, not km/h
//!
//! # Example
//!
//! ```no_run
//! use driver_safety::{
//!     capture::{Camera, CaptureConfig, SyntheticCamera},
//!     pipeline::{Collaborators, DetectionPipeline},
//!     analysis::Thresholds,
//! };
//! use std::sync::Arc;
//!
//! let mut camera = SyntheticCamera::new();
//! camera.open(&CaptureConfig::default()).unwrap();
//!
//! let mut pipeline = DetectionPipeline::new(
//!     Some(Box::new(camera)),
//!     &Collaborators::default(),
//!     Thresholds::default(),
//!     10,
//! );
//!
//! for _ in 0..10 {
//!     if let Some(frame) = pipeline.capture().unwrap() {
//!         let report = pipeline.evaluate(Arc::new(frame), Thresholds::default()).unwrap();
//!         for alert in report.alerts {
//!             println!("{}: {}", alert.kind, alert.message);
//!         }
//!     }
//! }
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod api;
pub mod capture;
pub mod config;
pub mod detection;
pub mod metrics;
pub mod pipeline;

// Re-export commonly used types at crate root
pub use analysis::{Alert, AlertKind, Thresholds};
pub use capture::{Camera, CaptureConfig, Frame, SourceDescriptor, SyntheticCamera};
pub use config::FileConfig;
pub use detection::{FeatureDetector, LandmarkModel};
pub use pipeline::{Collaborators, Session, SessionStatus, StartOutcome};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
