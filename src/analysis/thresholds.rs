//! Alert thresholds, shared live between the control surface and the
//! detection loop.

use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// Thresholds applied by the monitors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// EAR below this counts as a closed-eye frame.
    pub drowsiness: f64,
    /// Speed estimates above this raise an alert.
    pub speed: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            drowsiness: 0.7,
            speed: 60.0,
        }
    }
}

impl Thresholds {
    pub fn new(drowsiness: f64, speed: f64) -> Self {
        Self { drowsiness, speed }
    }

    /// Both values must be finite and non-negative.
    pub fn validate(&self) -> Result<(), InvalidThresholds> {
        if !self.drowsiness.is_finite() || self.drowsiness < 0.0 {
            return Err(InvalidThresholds::Drowsiness(self.drowsiness));
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(InvalidThresholds::Speed(self.speed));
        }
        Ok(())
    }
}

/// Threshold validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidThresholds {
    #[error("drowsiness threshold {0} must be finite and non-negative")]
    Drowsiness(f64),
    #[error("speed threshold {0} must be finite and non-negative")]
    Speed(f64),
}

/// Thresholds readable by the loop while the control surface updates them.
///
/// Updates apply from the next detection cycle on.
#[derive(Debug, Default)]
pub struct LiveThresholds {
    current: RwLock<Thresholds>,
}

impl LiveThresholds {
    pub fn new(initial: Thresholds) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    pub fn get(&self) -> Thresholds {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, thresholds: Thresholds) -> Result<(), InvalidThresholds> {
        thresholds.validate()?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = thresholds;
        tracing::info!(
            drowsiness = thresholds.drowsiness,
            speed = thresholds.speed,
            "Thresholds updated"
        );
        Ok(())
    }
}
