//! OpenCV-backed webcam and RTSP capture (feature `opencv`)

use crate::frame::{Frame, VideoSource};
use crate::source::FrameSource;
use image::RgbImage;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{
        VideoCapture, CAP_ANY, CAP_PROP_BUFFERSIZE, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT,
        CAP_PROP_FRAME_WIDTH,
    },
};
use sentinel_core::{Error, Result};
use tracing::info;

pub struct CameraSource {
    capture: VideoCapture,
    description: String,
    seq: u64,
}

impl CameraSource {
    /// Open a device index or stream URL and apply the capture settings.
    pub fn open(source: &VideoSource, resolution: (u32, u32), frame_rate: u32) -> Result<Self> {
        let mut capture = match source {
            VideoSource::Device(index) => VideoCapture::new(*index as i32, CAP_ANY)
                .map_err(|e| Error::Device(format!("failed to open camera {index}: {e}")))?,
            VideoSource::Url(url) => {
                let mut capture = VideoCapture::from_file(url, CAP_ANY)
                    .map_err(|e| Error::Device(format!("failed to open stream {url}: {e}")))?;
                // Keep the stream buffer shallow so a slow consumer sees
                // fresh frames, not a backlog.
                capture
                    .set(CAP_PROP_BUFFERSIZE, 1.0)
                    .map_err(|e| Error::Device(format!("failed to set buffer size: {e}")))?;
                capture
            }
        };

        let opened = capture
            .is_opened()
            .map_err(|e| Error::Device(format!("{source} not opened: {e}")))?;
        if !opened {
            return Err(Error::Device(format!("{source} failed to open")));
        }

        if let VideoSource::Device(_) = source {
            capture
                .set(CAP_PROP_FRAME_WIDTH, resolution.0 as f64)
                .map_err(|e| Error::Device(format!("failed to set width: {e}")))?;
            capture
                .set(CAP_PROP_FRAME_HEIGHT, resolution.1 as f64)
                .map_err(|e| Error::Device(format!("failed to set height: {e}")))?;
            capture
                .set(CAP_PROP_FPS, frame_rate as f64)
                .map_err(|e| Error::Device(format!("failed to set FPS: {e}")))?;
        }

        info!(
            source = %source,
            width = resolution.0,
            height = resolution.1,
            fps = frame_rate,
            "camera opened"
        );

        Ok(Self {
            capture,
            description: source.to_string(),
            seq: 0,
        })
    }
}

impl FrameSource for CameraSource {
    fn read_frame(&mut self) -> Result<Frame> {
        let mut bgr = Mat::default();
        let got = self
            .capture
            .read(&mut bgr)
            .map_err(|e| Error::Device(format!("failed to read frame: {e}")))?;
        if !got || bgr.cols() <= 0 || bgr.rows() <= 0 {
            return Err(Error::Device("camera returned no frame".to_string()));
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
            .map_err(|e| Error::Device(format!("failed to convert color: {e}")))?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let data = rgb
            .data_bytes()
            .map_err(|e| Error::Device(format!("failed to access frame data: {e}")))?;

        let image = RgbImage::from_raw(width, height, data.to_vec())
            .ok_or_else(|| Error::Device("frame buffer size mismatch".to_string()))?;

        let frame = Frame::new(image, self.seq);
        self.seq += 1;
        Ok(frame)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}
