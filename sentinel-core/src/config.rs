//! Persisted configuration, loaded once at startup

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration. Every section has sensible defaults so an empty
/// file (or no file at all) yields a runnable system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    pub detection: DetectionConfig,
    pub capture: CaptureConfig,
    pub alerts: AlertsConfig,
}

/// Thresholds and model parameters for the detection-to-alert decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum confidence for a detection to count toward an alert.
    pub confidence_threshold: f32,
    /// Consecutive qualifying frames required before an alert is raised.
    pub min_consecutive_frames: u32,
    /// Quiet seconds after the last qualifying detection before an active
    /// alert clears and re-arms.
    pub cooldown_secs: f64,
    /// Per-frame inference budget; slower frames are skipped.
    pub inference_timeout_ms: u64,
    /// Class labels in model output order.
    pub classes: Vec<String>,
    /// Path to the exported detection model.
    pub model_path: PathBuf,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.90,
            min_consecutive_frames: 3,
            cooldown_secs: 5.0,
            inference_timeout_ms: 1000,
            classes: vec!["pistol".to_string(), "knife".to_string()],
            model_path: PathBuf::from("models/weights/best.onnx"),
        }
    }
}

impl DetectionConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs)
    }

    pub fn inference_timeout(&self) -> Duration {
        Duration::from_millis(self.inference_timeout_ms)
    }
}

/// Video source and frame handoff parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Device index ("0", "1", ...) or an RTSP/file URL.
    pub source: String,
    /// Target frame rate (frames per second).
    pub frame_rate: u32,
    /// Camera resolution (width, height).
    pub resolution: (u32, u32),
    /// Capture-to-decision queue depth. Bounded at 1..=2; under
    /// backpressure the oldest frame is dropped.
    pub queue_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: "0".to_string(),
            frame_rate: 30,
            resolution: (640, 480),
            queue_capacity: 2,
        }
    }
}

/// Alert storage and notification delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Folder for alert snapshots.
    pub snapshot_dir: PathBuf,
    /// Append-only JSONL event log.
    pub event_log: PathBuf,
    /// Ring the terminal bell on each alert.
    pub console_bell: bool,
    /// Alerts kept in memory for the recent-alerts view.
    pub recent_capacity: usize,
    /// Notification queue depth; full means drop, never block.
    pub dispatch_capacity: usize,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("alerts"),
            event_log: PathBuf::from("alerts/events.jsonl"),
            console_bell: true,
            recent_capacity: 100,
            dispatch_capacity: 64,
        }
    }
}

impl SentinelConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: SentinelConfig = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration. Out-of-range values are startup errors, not
    /// silent clamps.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        if !d.confidence_threshold.is_finite()
            || !(0.0..=1.0).contains(&d.confidence_threshold)
        {
            return Err(Error::Config(
                "confidence_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if d.min_consecutive_frames == 0 {
            return Err(Error::Config(
                "min_consecutive_frames must be at least 1".to_string(),
            ));
        }
        if !d.cooldown_secs.is_finite() || d.cooldown_secs < 0.0 {
            return Err(Error::Config(
                "cooldown_secs must be non-negative".to_string(),
            ));
        }
        if d.inference_timeout_ms == 0 {
            return Err(Error::Config(
                "inference_timeout_ms must be non-zero".to_string(),
            ));
        }
        if d.classes.is_empty() {
            return Err(Error::Config("classes must not be empty".to_string()));
        }

        let c = &self.capture;
        if c.frame_rate == 0 || c.frame_rate > 120 {
            return Err(Error::Config(
                "frame_rate must be between 1 and 120".to_string(),
            ));
        }
        if c.resolution.0 == 0 || c.resolution.1 == 0 {
            return Err(Error::Config("resolution must be non-zero".to_string()));
        }
        let total_pixels = c
            .resolution
            .0
            .checked_mul(c.resolution.1)
            .ok_or_else(|| Error::Config("resolution would overflow".to_string()))?;
        if total_pixels > 100_000_000 {
            return Err(Error::Config(
                "resolution too large (max 100M pixels)".to_string(),
            ));
        }
        if !(1..=2).contains(&c.queue_capacity) {
            return Err(Error::Config(
                "queue_capacity must be 1 or 2".to_string(),
            ));
        }
        if c.source.trim().is_empty() {
            return Err(Error::Config("source must not be empty".to_string()));
        }

        let a = &self.alerts;
        if a.recent_capacity == 0 {
            return Err(Error::Config(
                "recent_capacity must be at least 1".to_string(),
            ));
        }
        if a.dispatch_capacity == 0 {
            return Err(Error::Config(
                "dispatch_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = SentinelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection.confidence_threshold, 0.90);
        assert_eq!(config.detection.min_consecutive_frames, 3);
        assert_eq!(config.detection.cooldown(), Duration::from_secs(5));
        assert_eq!(config.capture.resolution, (640, 480));
        assert_eq!(config.capture.queue_capacity, 2);
        assert_eq!(config.alerts.recent_capacity, 100);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut config = SentinelConfig::default();
        config.detection.confidence_threshold = 1.4;
        assert!(config.validate().is_err());
        config.detection.confidence_threshold = -0.1;
        assert!(config.validate().is_err());
        config.detection.confidence_threshold = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let mut config = SentinelConfig::default();
        config.detection.min_consecutive_frames = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_frame_rate_bounds() {
        let mut config = SentinelConfig::default();
        config.capture.frame_rate = 0;
        assert!(config.validate().is_err());
        config.capture.frame_rate = 121;
        assert!(config.validate().is_err());
        config.capture.frame_rate = 120;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolution_overflow_guard() {
        let mut config = SentinelConfig::default();
        config.capture.resolution = (u32::MAX, 2);
        assert!(config.validate().is_err());
        config.capture.resolution = (10001, 10000);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_queue_capacity_bounds() {
        let mut config = SentinelConfig::default();
        config.capture.queue_capacity = 0;
        assert!(config.validate().is_err());
        config.capture.queue_capacity = 3;
        assert!(config.validate().is_err());
        config.capture.queue_capacity = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[detection]\nconfidence_threshold = 0.6\nmin_consecutive_frames = 2\n"
        )
        .unwrap();

        let config = SentinelConfig::load(file.path()).unwrap();
        assert_eq!(config.detection.confidence_threshold, 0.6);
        assert_eq!(config.detection.min_consecutive_frames, 2);
        // Unspecified sections fall back to defaults
        assert_eq!(config.capture.frame_rate, 30);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[capture]\nframe_rate = 0\n").unwrap();
        assert!(SentinelConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = SentinelConfig::load(Path::new("/nonexistent/sentinel.toml")).unwrap_err();
        assert!(err.to_string().contains("Configuration error"));
    }
}
