//! Notification sinks: where confirmed alerts go
//!
//! Every sink is best-effort. A sink error is logged by the dispatcher and
//! never reaches the decision loop.

pub mod console;
pub mod event_log;
pub mod snapshot;

pub use console::ConsoleSink;
pub use event_log::{AlertRecord, EventLogSink};
pub use snapshot::{resolve_snapshot_dir, snapshot_filename, SnapshotSink};

use crate::dispatch::NotificationJob;
use sentinel_core::Result;

pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Deliver one alert. Failures are reported, not propagated.
    fn notify(&self, job: &NotificationJob) -> Result<()>;
}
