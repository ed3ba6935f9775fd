//! Speed threshold check.
//!
//! Unlike drowsiness there is no debounce: a single estimate over the
//! threshold alerts immediately. Estimates are noisy frame to frame, so
//! expect occasional one-frame alerts.

use super::Alert;

/// Raises speed alerts from motion estimates.
#[derive(Debug, Clone)]
pub struct SpeedMonitor {
    threshold: f64,
}

impl SpeedMonitor {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Returns an alert if `estimate` exceeds the threshold.
    pub fn observe(&self, estimate: f64) -> Option<Alert> {
        (estimate > self.threshold).then(|| Alert::speed(estimate, self.threshold))
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for SpeedMonitor {
    fn default() -> Self {
        Self::new(super::Thresholds::default().speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AlertKind;

    #[test]
    fn test_single_estimate_over_threshold_alerts() {
        let monitor = SpeedMonitor::new(60.0);
        let alert = monitor.observe(61.0).unwrap();

        assert_eq!(alert.kind, AlertKind::Speed);
        assert_eq!(alert.metric, 61.0);
    }

    #[test]
    fn test_at_or_below_threshold_is_quiet() {
        let monitor = SpeedMonitor::new(60.0);
        assert!(monitor.observe(60.0).is_none());
        assert!(monitor.observe(12.0).is_none());
    }

    #[test]
    fn test_threshold_update() {
        let mut monitor = SpeedMonitor::new(60.0);
        monitor.set_threshold(80.0);
        assert!(monitor.observe(70.0).is_none());
        assert_eq!(monitor.threshold(), 80.0);
    }
}
