//! sentinel-alert: the Alert Decision Component and notification delivery
//!
//! Converts the noisy per-frame detection stream into a debounced,
//! rate-limited alert stream (`engine`), and fans confirmed alerts out to
//! best-effort notification sinks (`dispatch`, `sink`) without ever
//! blocking the decision loop.

pub mod dispatch;
pub mod engine;
pub mod sink;

pub use dispatch::{AlertDispatcher, NotificationJob};
pub use engine::{AlertEngine, AlertPolicy, AlertState};
pub use sink::{ConsoleSink, EventLogSink, NotificationSink, SnapshotSink};
