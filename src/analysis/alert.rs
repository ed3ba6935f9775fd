//! Alert payloads produced by the monitors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which monitor raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Drowsiness,
    Speed,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Drowsiness => f.write_str("drowsiness"),
            AlertKind::Speed => f.write_str("speed"),
        }
    }
}

/// A driver-safety alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// The signal value that triggered it: average EAR or speed estimate.
    pub metric: f64,
    pub detected_at: DateTime<Utc>,
}

impl Alert {
    pub fn drowsiness(ear: f64) -> Self {
        Self {
            kind: AlertKind::Drowsiness,
            message: "Driver appears to be drowsy - eyes closed detected".to_string(),
            confidence: (1.0 - ear).clamp(0.0, 1.0),
            metric: ear,
            detected_at: Utc::now(),
        }
    }

    pub fn speed(estimate: f64, threshold: f64) -> Self {
        let confidence = if threshold > 0.0 {
            (estimate / (threshold * 1.5)).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            kind: AlertKind::Speed,
            message: format!("Vehicle speed exceeds limit: {estimate:.1} km/h"),
            confidence,
            metric: estimate,
            detected_at: Utc::now(),
        }
    }
}
