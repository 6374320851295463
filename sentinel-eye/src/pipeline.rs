//! The sequential decision loop
//!
//! One frame is processed to completion (inference, alert decision,
//! notification dispatch) before the next is accepted. Inference runs on a
//! blocking task under a timeout so a wedged model skips frames instead of
//! stalling the loop; notification delivery is handed off and never awaited.

use crate::frame::Frame;
use crate::infer::InferenceProvider;
use crate::queue::FrameQueue;
use sentinel_alert::{AlertDispatcher, AlertEngine, NotificationJob};
use sentinel_alert::sink::snapshot_filename;
use sentinel_core::{Detection, Error, PipelineStats, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct DetectionPipeline {
    queue: Arc<FrameQueue>,
    provider: Arc<dyn InferenceProvider>,
    engine: AlertEngine,
    dispatcher: AlertDispatcher,
    stats: Arc<PipelineStats>,
    snapshot_dir: PathBuf,
    inference_timeout: Duration,
}

impl DetectionPipeline {
    pub fn new(
        queue: Arc<FrameQueue>,
        provider: Arc<dyn InferenceProvider>,
        engine: AlertEngine,
        dispatcher: AlertDispatcher,
        stats: Arc<PipelineStats>,
        snapshot_dir: PathBuf,
        inference_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            provider,
            engine,
            dispatcher,
            stats,
            snapshot_dir,
            inference_timeout,
        }
    }

    /// Run until the frame queue closes (capture stopped or gave up) or the
    /// model becomes unavailable. Queued notifications are drained before
    /// returning.
    pub async fn run(mut self) -> Result<()> {
        let result = self.frame_loop().await;
        self.dispatcher.shutdown().await;
        info!("detection pipeline stopped");
        result
    }

    async fn frame_loop(&mut self) -> Result<()> {
        let mut dropped_seen = 0u64;

        while let Some(frame) = self.queue.pop().await {
            self.stats.record_frame();

            let newly_dropped = self.queue.dropped();
            if newly_dropped > dropped_seen {
                self.stats.record_frames_dropped(newly_dropped - dropped_seen);
                dropped_seen = newly_dropped;
            }

            let frame = Arc::new(frame);
            let detections = match self.infer(frame.clone()).await {
                Ok(detections) => detections,
                Err(Error::ModelUnavailable(msg)) => {
                    // Nothing downstream can recover from a missing model.
                    error!(error = %msg, "model unavailable, stopping stream");
                    return Err(Error::ModelUnavailable(msg));
                }
                Err(e) => {
                    self.stats.record_inference_error();
                    warn!(seq = frame.seq, error = %e, "inference failed, skipping frame");
                    continue;
                }
            };

            self.stats.record_detections(detections.len() as u64);
            if !detections.is_empty() {
                debug!(seq = frame.seq, count = detections.len(), "frame detections");
            }

            let malformed_before = self.engine.malformed_dropped();
            let events = self.engine.process(&detections, frame.captured_at);
            let malformed_now = self.engine.malformed_dropped();
            if malformed_now > malformed_before {
                self.stats.record_malformed(malformed_now - malformed_before);
            }

            if events.is_empty() {
                continue;
            }
            self.stats.record_alerts(events.len() as u64);

            let mut annotated = frame.image.clone();
            let drawable: Vec<Detection> = detections
                .iter()
                .filter(|d| d.is_well_formed())
                .cloned()
                .collect();
            crate::annotate::annotate(&mut annotated, &drawable);

            for mut event in events {
                event.snapshot = Some(self.snapshot_dir.join(snapshot_filename(&event)));
                info!(
                    class = %event.class,
                    confidence = event.confidence,
                    "weapon alert raised"
                );
                self.dispatcher.dispatch(NotificationJob {
                    event,
                    image: Some(annotated.clone()),
                });
            }
        }

        Ok(())
    }

    /// Run the provider on a blocking task under the configured budget.
    async fn infer(&self, frame: Arc<Frame>) -> Result<Vec<Detection>> {
        let provider = self.provider.clone();
        let task = tokio::task::spawn_blocking(move || provider.detect(&frame));

        match tokio::time::timeout(self.inference_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(Error::ModelUnavailable(format!(
                "inference task failed: {join_error}"
            ))),
            Err(_) => Err(Error::InferenceTimeout {
                elapsed_ms: self.inference_timeout.as_millis() as u64,
            }),
        }
    }
}
