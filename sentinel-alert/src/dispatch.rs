//! Fire-and-forget notification delivery
//!
//! Alert delivery (snapshot write, log append, console output) must never
//! block or crash the decision loop. Jobs go through a bounded channel with
//! `try_send`; a full queue drops the job with a warning.

use crate::sink::NotificationSink;
use image::RgbImage;
use sentinel_core::{AlertEvent, PipelineStats};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One alert plus the annotated frame it should be delivered with.
pub struct NotificationJob {
    pub event: AlertEvent,
    pub image: Option<RgbImage>,
}

/// Owns the delivery worker. Dropping the dispatcher closes the queue; the
/// worker drains what was already accepted.
pub struct AlertDispatcher {
    tx: mpsc::Sender<NotificationJob>,
    worker: Option<JoinHandle<()>>,
    stats: Arc<PipelineStats>,
}

impl AlertDispatcher {
    /// Spawn the delivery worker over the given sinks.
    pub fn spawn(
        sinks: Vec<Arc<dyn NotificationSink>>,
        capacity: usize,
        stats: Arc<PipelineStats>,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<NotificationJob>(capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                for sink in &sinks {
                    // A failing sink is logged and skipped; delivery to the
                    // remaining sinks continues.
                    if let Err(e) = sink.notify(&job) {
                        warn!(sink = sink.name(), error = %e, "notification sink failed");
                    }
                }
                debug!(class = %job.event.class, "alert delivered");
            }
        });

        Self {
            tx,
            worker: Some(worker),
            stats,
        }
    }

    /// Hand off a job without blocking. Under backpressure the job is
    /// dropped and counted.
    pub fn dispatch(&self, job: NotificationJob) {
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(job)) => {
                self.stats.record_notification_dropped();
                warn!(
                    class = %job.event.class,
                    "notification queue full, dropping alert delivery"
                );
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                self.stats.record_notification_dropped();
                warn!(
                    class = %job.event.class,
                    "notification worker gone, dropping alert delivery"
                );
            }
        }
    }

    /// Close the queue and wait for queued deliveries to finish.
    pub async fn shutdown(mut self) {
        let worker = self.worker.take();
        // Dropping `self` drops `tx`, closing the channel so the worker's
        // recv loop ends. The `Drop` impl won't abort the worker because it
        // was just taken out above.
        drop(self);
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!(error = %e, "notification worker ended abnormally");
            }
        }
    }
}

impl Drop for AlertDispatcher {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}
