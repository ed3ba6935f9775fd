//! Drowsiness debounce.
//!
//! A single low-EAR frame is noise; the monitor only alerts once the
//! eyes have stayed below the threshold for a run of consecutive frames.
//! The alert is level-triggered: it is re-raised on every frame while
//! the run continues.

use super::Alert;

/// Consecutive closed-eye frames required before alerting.
pub const DEFAULT_CLOSED_FRAME_TRIGGER: u32 = 10;

/// Counts consecutive closed-eye frames and raises drowsiness alerts.
#[derive(Debug, Clone)]
pub struct DrowsinessMonitor {
    /// EAR below this counts as closed.
    threshold: f64,
    /// Current run of closed frames.
    consecutive_closed_frames: u32,
    /// Run length at which alerts start.
    closed_frame_trigger: u32,
}

impl DrowsinessMonitor {
    pub fn new(threshold: f64) -> Self {
        Self::with_trigger(threshold, DEFAULT_CLOSED_FRAME_TRIGGER)
    }

    /// Creates a monitor with a custom run length.
    pub fn with_trigger(threshold: f64, closed_frame_trigger: u32) -> Self {
        Self {
            threshold,
            consecutive_closed_frames: 0,
            closed_frame_trigger: closed_frame_trigger.max(1),
        }
    }

    /// Feeds one frame's average EAR. Returns an alert while the closed
    /// run is at or beyond the trigger.
    pub fn observe(&mut self, ear: f64) -> Option<Alert> {
        if ear < self.threshold {
            self.consecutive_closed_frames = self.consecutive_closed_frames.saturating_add(1);
        } else {
            if self.consecutive_closed_frames >= self.closed_frame_trigger {
                tracing::info!(
                    frames = self.consecutive_closed_frames,
                    "Eyes reopened after drowsy run"
                );
            }
            self.consecutive_closed_frames = 0;
        }

        tracing::trace!(
            ear,
            closed_frames = self.consecutive_closed_frames,
            "Drowsiness observation"
        );

        (self.consecutive_closed_frames >= self.closed_frame_trigger).then(|| Alert::drowsiness(ear))
    }

    /// Changes the threshold without touching the current run.
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn consecutive_closed_frames(&self) -> u32 {
        self.consecutive_closed_frames
    }

    pub fn reset(&mut self) {
        self.consecutive_closed_frames = 0;
    }
}

impl Default for DrowsinessMonitor {
    fn default() -> Self {
        Self::new(super::Thresholds::default().drowsiness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AlertKind;

    fn firing_cycles(monitor: &mut DrowsinessMonitor, ears: &[f64]) -> Vec<usize> {
        ears.iter()
            .enumerate()
            .filter_map(|(i, &ear)| monitor.observe(ear).map(|_| i + 1))
            .collect()
    }

    #[test]
    fn test_fires_every_cycle_once_triggered() {
        let mut monitor = DrowsinessMonitor::with_trigger(0.7, 10);
        let fired = firing_cycles(&mut monitor, &[0.1; 15]);

        assert_eq!(fired, (10..=15).collect::<Vec<_>>());
    }

    #[test]
    fn test_reset_before_trigger_never_fires() {
        let mut monitor = DrowsinessMonitor::with_trigger(0.7, 10);
        let mut ears = vec![0.1; 9];
        ears.push(0.9);

        assert!(firing_cycles(&mut monitor, &ears).is_empty());
        assert_eq!(monitor.consecutive_closed_frames(), 0);
    }

    #[test]
    fn test_open_frame_ends_alerting() {
        let mut monitor = DrowsinessMonitor::with_trigger(0.7, 3);
        firing_cycles(&mut monitor, &[0.1; 5]);

        assert!(monitor.observe(0.8).is_none());
        assert!(monitor.observe(0.1).is_none());
    }

    #[test]
    fn test_alert_payload() {
        let mut monitor = DrowsinessMonitor::with_trigger(0.7, 1);
        let alert = monitor.observe(0.2).unwrap();

        assert_eq!(alert.kind, AlertKind::Drowsiness);
        assert!((alert.confidence - 0.8).abs() < 1e-12);
        assert_eq!(alert.metric, 0.2);
    }

    #[test]
    fn test_threshold_change_keeps_run() {
        let mut monitor = DrowsinessMonitor::with_trigger(0.7, 3);
        monitor.observe(0.1);
        monitor.observe(0.1);

        monitor.set_threshold(0.3);
        assert_eq!(monitor.consecutive_closed_frames(), 2);
        assert!(monitor.observe(0.2).is_some());
    }
}
