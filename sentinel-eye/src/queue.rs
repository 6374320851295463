//! Bounded latest-wins frame handoff
//!
//! Capacity 1-2 with drop-oldest under backpressure: a stale frame is not
//! worth processing late, so the capture side always wins and the decision
//! loop always sees the freshest work available.

use crate::frame::Frame;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;
use tracing::trace;

struct Inner {
    frames: VecDeque<Frame>,
    closed: bool,
}

pub struct FrameQueue {
    inner: Mutex<Inner>,
    notify: Notify,
    capacity: usize,
    dropped: AtomicU64,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                frames: VecDeque::with_capacity(capacity.clamp(1, 2)),
                closed: false,
            }),
            notify: Notify::new(),
            capacity: capacity.clamp(1, 2),
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue a frame, evicting the oldest one if full. Frames pushed
    /// after `close` are discarded.
    pub fn push(&self, frame: Frame) {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return;
            }
            if inner.frames.len() == self.capacity {
                let evicted = inner.frames.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(seq = evicted.map(|f| f.seq), "dropping stale frame");
            }
            inner.frames.push_back(frame);
        }
        self.notify.notify_one();
    }

    /// Wait for the next frame. Returns `None` once the queue is closed
    /// and drained.
    pub async fn pop(&self) -> Option<Frame> {
        loop {
            let notified = self.notify.notified();
            {
                let mut inner = self.inner.lock();
                if let Some(frame) = inner.frames.pop_front() {
                    return Some(frame);
                }
                if inner.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Close the queue; waiting consumers wake and drain what remains.
    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames evicted unprocessed since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
