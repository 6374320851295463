//! Frame sources
//!
//! The pipeline only sees the `FrameSource` trait; real cameras live behind
//! the `opencv` feature, and tests and the demo mode use the synthetic
//! pattern source.

use crate::frame::Frame;
use image::{Rgb, RgbImage};
use sentinel_core::Result;

pub trait FrameSource: Send {
    /// Read the next frame, blocking until one is available. Device
    /// failures surface as `Error::Device` and are retried by the capture
    /// supervisor.
    fn read_frame(&mut self) -> Result<Frame>;

    /// Human-readable description for logs ("device 0", an RTSP URL, ...).
    fn describe(&self) -> String;
}

/// Deterministic test-pattern source: a dark background with a bright
/// square that moves one step per frame.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    seq: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(16),
            height: height.max(16),
            seq: 0,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn read_frame(&mut self) -> Result<Frame> {
        let mut image = RgbImage::from_pixel(self.width, self.height, Rgb([24, 24, 24]));

        let square = 8u32;
        let x0 = (self.seq as u32 * 4) % (self.width - square).max(1);
        let y0 = (self.seq as u32 * 2) % (self.height - square).max(1);
        for y in y0..y0 + square {
            for x in x0..x0 + square {
                image.put_pixel(x, y, Rgb([220, 220, 220]));
            }
        }

        let frame = Frame::new(image, self.seq);
        self.seq += 1;
        Ok(frame)
    }

    fn describe(&self) -> String {
        format!("synthetic {}x{}", self.width, self.height)
    }
}
