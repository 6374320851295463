//! Capture supervision: open, pace, retry
//!
//! Runs the blocking frame-read loop on its own thread, pacing reads to the
//! configured frame rate and pushing into the latest-wins queue. Device
//! failures are retried with exponential backoff; only a persistently dead
//! source ends the stream, which closes the queue and lets the pipeline
//! finish.

use crate::queue::FrameQueue;
use crate::source::FrameSource;
use sentinel_core::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// How a fresh `FrameSource` is produced for each (re)open attempt.
pub type SourceFactory = Box<dyn Fn() -> Result<Box<dyn FrameSource>> + Send>;

/// Backoff and give-up limits for a flaky or absent device.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Consecutive failed opens before the stream is declared dead.
    pub max_open_attempts: u32,
    /// Consecutive failed reads before the source is reopened.
    pub max_read_errors: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            max_open_attempts: 10,
            max_read_errors: 10,
        }
    }
}

pub struct CaptureSupervisor {
    stop: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl CaptureSupervisor {
    /// Start capturing into `queue` at `frame_rate` frames per second.
    pub fn start(factory: SourceFactory, queue: Arc<FrameQueue>, frame_rate: u32) -> Self {
        Self::start_with_policy(factory, queue, frame_rate, RetryPolicy::default())
    }

    pub fn start_with_policy(
        factory: SourceFactory,
        queue: Arc<FrameQueue>,
        frame_rate: u32,
        policy: RetryPolicy,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();

        let handle = std::thread::Builder::new()
            .name("sentinel-capture".to_string())
            .spawn(move || capture_loop(factory, queue, frame_rate, policy, thread_stop))
            .expect("failed to spawn capture thread");

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Signal the loop to stop and wait for it to finish. The queue is
    /// closed by the loop on the way out.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CaptureSupervisor {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn capture_loop(
    factory: SourceFactory,
    queue: Arc<FrameQueue>,
    frame_rate: u32,
    policy: RetryPolicy,
    stop: Arc<AtomicBool>,
) {
    let frame_rate = frame_rate.max(1);
    let frame_interval = Duration::from_secs_f64(1.0 / frame_rate as f64);
    let mut open_attempts = 0u32;
    let mut backoff = policy.initial_backoff;

    'reopen: loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }

        let mut source = match factory() {
            Ok(source) => {
                open_attempts = 0;
                backoff = policy.initial_backoff;
                info!(source = %source.describe(), "video source opened");
                source
            }
            Err(e) => {
                open_attempts += 1;
                if open_attempts >= policy.max_open_attempts {
                    error!(error = %e, "giving up on video source after {open_attempts} attempts");
                    break;
                }
                warn!(error = %e, "failed to open video source, retrying in {backoff:?}");
                sleep_interruptible(backoff, &stop);
                backoff = (backoff * 2).min(policy.max_backoff);
                continue;
            }
        };

        let mut read_errors = 0u32;
        let mut read_backoff = policy.initial_backoff;
        loop {
            if stop.load(Ordering::Relaxed) {
                break 'reopen;
            }
            let started = Instant::now();

            match source.read_frame() {
                Ok(frame) => {
                    read_errors = 0;
                    read_backoff = policy.initial_backoff;
                    queue.push(frame);
                }
                Err(e) => {
                    read_errors += 1;
                    warn!(
                        error = %e,
                        "frame read failed ({read_errors}/{})",
                        policy.max_read_errors
                    );
                    if read_errors >= policy.max_read_errors {
                        error!("too many consecutive read errors, reopening video source");
                        continue 'reopen;
                    }
                    sleep_interruptible(read_backoff, &stop);
                    read_backoff = (read_backoff * 2).min(policy.max_backoff);
                    continue;
                }
            }

            let elapsed = started.elapsed();
            if elapsed < frame_interval {
                sleep_interruptible(frame_interval - elapsed, &stop);
            }
        }
    }

    queue.close();
    info!("capture loop stopped");
}

/// Sleep in small slices so a stop request is honored promptly.
fn sleep_interruptible(total: Duration, stop: &AtomicBool) {
    let slice = Duration::from_millis(20);
    let deadline = Instant::now() + total;
    loop {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        std::thread::sleep(slice.min(deadline - now));
    }
}
