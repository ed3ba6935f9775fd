//! Turning per-frame signals into alerts.
//!
//! Drowsiness is debounced over consecutive frames; speed is a plain
//! threshold check. Both produce the same [`Alert`] payload.

mod alert;
mod drowsiness;
mod speed;
mod thresholds;

pub use alert::{Alert, AlertKind};
pub use drowsiness::{DrowsinessMonitor, DEFAULT_CLOSED_FRAME_TRIGGER};
pub use speed::SpeedMonitor;
pub use thresholds::{InvalidThresholds, LiveThresholds, Thresholds};
