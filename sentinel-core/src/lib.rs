//! sentinel-core: shared foundation for the Sentinel weapon-detection pipeline
//!
//! Holds the domain types exchanged between the capture, inference, and
//! alerting crates, the error taxonomy, the persisted configuration, and the
//! runtime counters surfaced in the operator summary.

pub mod config;
pub mod error;
pub mod stats;
pub mod types;

pub use config::{AlertsConfig, CaptureConfig, DetectionConfig, SentinelConfig};
pub use error::{Error, Result};
pub use stats::{PipelineStats, StatsSnapshot};
pub use types::{AlertEvent, BoundingBox, Detection, WeaponClass};
