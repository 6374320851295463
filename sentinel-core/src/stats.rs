//! Runtime counters for the operator summary
//!
//! Counters cross the capture thread, the decision loop, and the
//! notification worker, so they are plain relaxed atomics.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct PipelineStats {
    frames_processed: AtomicU64,
    frames_dropped: AtomicU64,
    detections: AtomicU64,
    malformed_dropped: AtomicU64,
    alerts_raised: AtomicU64,
    notifications_dropped: AtomicU64,
    inference_errors: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub detections: u64,
    pub malformed_dropped: u64,
    pub alerts_raised: u64,
    pub notifications_dropped: u64,
    pub inference_errors: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&self) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frames_dropped(&self, n: u64) {
        self.frames_dropped.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_detections(&self, n: u64) {
        self.detections.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_malformed(&self, n: u64) {
        self.malformed_dropped.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_alerts(&self, n: u64) {
        self.alerts_raised.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_notification_dropped(&self) {
        self.notifications_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inference_error(&self) {
        self.inference_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            malformed_dropped: self.malformed_dropped.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
            notifications_dropped: self.notifications_dropped.load(Ordering::Relaxed),
            inference_errors: self.inference_errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = PipelineStats::new();
        stats.record_frame();
        stats.record_frame();
        stats.record_detections(3);
        stats.record_alerts(1);
        stats.record_notification_dropped();

        let snap = stats.snapshot();
        assert_eq!(snap.frames_processed, 2);
        assert_eq!(snap.detections, 3);
        assert_eq!(snap.alerts_raised, 1);
        assert_eq!(snap.notifications_dropped, 1);
        assert_eq!(snap.inference_errors, 0);
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Arc;

        let stats = Arc::new(PipelineStats::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let stats = stats.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record_frame();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(stats.snapshot().frames_processed, 400);
    }
}
