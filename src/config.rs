//! File configuration.
//!
//! Every section has defaults, so an empty file (or no file at all)
//! yields a working service.

use crate::analysis::{Thresholds, DEFAULT_CLOSED_FRAME_TRIGGER};
use crate::capture::CaptureConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detection.validate()?;
        self.stream.validate()?;
        self.capture
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 8000).into(),
        }
    }
}

/// Detection loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Initial EAR threshold.
    pub drowsiness_threshold: f64,
    /// Initial speed threshold.
    pub speed_threshold: f64,
    /// Consecutive closed-eye frames before alerting.
    pub closed_frame_trigger: u32,
    /// Pause between cycles while frames are flowing (~10 Hz).
    pub cycle_interval_ms: u64,
    /// Pause while no source is attached.
    pub no_source_interval_ms: u64,
    /// Pause after a failed cycle.
    pub error_backoff_ms: u64,
    /// How long `stop` waits for the loop to exit.
    pub stop_timeout_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            drowsiness_threshold: thresholds.drowsiness,
            speed_threshold: thresholds.speed,
            closed_frame_trigger: DEFAULT_CLOSED_FRAME_TRIGGER,
            cycle_interval_ms: 100,
            no_source_interval_ms: 500,
            error_backoff_ms: 1000,
            stop_timeout_ms: 5000,
        }
    }
}

impl DetectionConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds::new(self.drowsiness_threshold, self.speed_threshold)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn no_source_interval(&self) -> Duration {
        Duration::from_millis(self.no_source_interval_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.closed_frame_trigger == 0 {
            return Err(ConfigError::Invalid(
                "closed_frame_trigger must be at least 1".into(),
            ));
        }
        if self.cycle_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "cycle_interval_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Video feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Pause between emitted frames (~30 Hz).
    pub frame_interval_ms: u64,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 33,
            jpeg_quality: 80,
        }
    }
}

impl StreamConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "frame_interval_ms must be positive".into(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality {} outside 1-100",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = FileConfig::from_toml("").unwrap();
        assert_eq!(config.server.bind_addr.port(), 8000);
        assert_eq!(config.detection.closed_frame_trigger, 10);
        assert_eq!(config.detection.thresholds(), Thresholds::default());
        assert_eq!(config.stream.frame_interval_ms, 33);
    }

    #[test]
    fn test_partial_sections() {
        let config = FileConfig::from_toml(
            r#"
            [detection]
            speed_threshold = 90.0
            cycle_interval_ms = 50

            [capture]
            width = 320
            height = 240
            fps = 15
            synthetic_motion_px = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.detection.speed_threshold, 90.0);
        assert_eq!(config.detection.drowsiness_threshold, 0.7);
        assert_eq!(config.detection.cycle_interval(), Duration::from_millis(50));
        assert_eq!(config.capture.width, 320);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            FileConfig::from_toml("[detection]\nclosed_frame_trigger = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FileConfig::from_toml("[stream]\njpeg_quality = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            FileConfig::from_toml("[detection]\nspeed_threshold = -5.0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            FileConfig::from_toml("[detection"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
