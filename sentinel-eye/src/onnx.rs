//! ONNX Runtime inference backend (feature `onnx`)
//!
//! Wraps an exported detection model: resize preprocessing into a CHW
//! float tensor, confidence/class filtering, and NMS over the raw output.
//! CPU execution only, matching the deployment target.

use crate::frame::Frame;
use crate::infer::{non_max_suppression, InferenceProvider};
use image::imageops::FilterType;
use ort::{Environment, Session, Value};
use sentinel_core::{BoundingBox, Detection, Error, Result, WeaponClass};
use std::path::Path;
use tracing::{debug, info, warn};

const INPUT_SIZE: (u32, u32) = (640, 640);
const IOU_THRESHOLD: f32 = 0.45;

pub struct OnnxWeaponDetector {
    session: Session,
    classes: Vec<String>,
    confidence_threshold: f32,
}

impl OnnxWeaponDetector {
    /// Load the exported model. A missing or unloadable file is
    /// `ModelUnavailable`; there is no fallback model.
    pub fn load(model_path: &Path, classes: Vec<String>, confidence_threshold: f32) -> Result<Self> {
        if !model_path.exists() {
            return Err(Error::ModelUnavailable(format!(
                "model not found at {}",
                model_path.display()
            )));
        }

        let _environment = Environment::builder()
            .with_name("sentinel-eye")
            .build()
            .map_err(|e| Error::ModelUnavailable(format!("ONNX environment: {e}")))?;

        let session = Session::builder()
            .map_err(|e| Error::ModelUnavailable(format!("ONNX session builder: {e}")))?
            .with_execution_providers([ort::ExecutionProvider::CPU(Default::default())])
            .map_err(|e| Error::ModelUnavailable(format!("ONNX execution provider: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| Error::ModelUnavailable(format!("loading model: {e}")))?;

        info!(model = %model_path.display(), "detection model loaded");

        Ok(Self {
            session,
            classes,
            confidence_threshold,
        })
    }

    /// Resize to the model input and lay pixels out as [1, 3, H, W] floats
    /// in [0, 1].
    fn preprocess(&self, frame: &Frame) -> Vec<f32> {
        let resized = image::imageops::resize(
            &frame.image,
            INPUT_SIZE.0,
            INPUT_SIZE.1,
            FilterType::Triangle,
        );

        let (w, h) = (INPUT_SIZE.0 as usize, INPUT_SIZE.1 as usize);
        let mut chw = vec![0.0f32; 3 * w * h];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let idx = y as usize * w + x as usize;
            chw[idx] = pixel[0] as f32 / 255.0;
            chw[w * h + idx] = pixel[1] as f32 / 255.0;
            chw[2 * w * h + idx] = pixel[2] as f32 / 255.0;
        }
        chw
    }

    fn postprocess(
        &self,
        output: &ort::ndarray::ArrayViewD<'_, f32>,
        frame: &Frame,
    ) -> Vec<Detection> {
        let shape = output.shape();
        debug!(?shape, "model output shape");
        if shape.len() < 3 {
            warn!(?shape, "unexpected model output rank, dropping frame output");
            return Vec::new();
        }

        // Output rows are [x, y, w, h, conf, class probs...], boxes
        // normalized to [0, 1].
        let num_rows = shape[1];
        let attrs = 5 + self.classes.len();
        if shape[2] < attrs {
            warn!(?shape, attrs, "model output narrower than class list");
            return Vec::new();
        }

        let frame_w = frame.width() as f32;
        let frame_h = frame.height() as f32;
        let mut detections = Vec::new();

        for row in 0..num_rows.min(300) {
            let conf = match output.get([0, row, 4]) {
                Some(c) if *c >= self.confidence_threshold => *c,
                _ => continue,
            };

            let mut best_class = 0usize;
            let mut best_prob = 0.0f32;
            for (class_idx, _) in self.classes.iter().enumerate() {
                if let Some(prob) = output.get([0, row, 5 + class_idx]) {
                    if *prob > best_prob {
                        best_prob = *prob;
                        best_class = class_idx;
                    }
                }
            }
            if best_prob < self.confidence_threshold {
                continue;
            }

            let class = match self.classes[best_class].parse::<WeaponClass>() {
                Ok(class) => class,
                Err(_) => {
                    // The model knows classes this pipeline does not track.
                    debug!(label = %self.classes[best_class], "ignoring untracked class");
                    continue;
                }
            };

            let x = output.get([0, row, 0]).copied().unwrap_or(0.0);
            let y = output.get([0, row, 1]).copied().unwrap_or(0.0);
            let w = output.get([0, row, 2]).copied().unwrap_or(0.0);
            let h = output.get([0, row, 3]).copied().unwrap_or(0.0);

            if ![x, y, w, h].iter().all(|v| v.is_finite() && (0.0..=1.0).contains(v)) {
                warn!("dropping detection with out-of-range box");
                continue;
            }

            let bbox =
                BoundingBox::new(x * frame_w, y * frame_h, w * frame_w, h * frame_h)
                    .clamp_to(frame.width(), frame.height());
            if bbox.w <= 0.0 || bbox.h <= 0.0 {
                continue;
            }

            detections.push(Detection {
                class,
                confidence: conf.min(best_prob),
                bbox,
                observed_at: frame.captured_at,
            });
        }

        non_max_suppression(detections, IOU_THRESHOLD)
    }
}

impl InferenceProvider for OnnxWeaponDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<Detection>> {
        let chw = self.preprocess(frame);

        let array = ort::ndarray::Array::from_shape_vec(
            (1usize, 3, INPUT_SIZE.1 as usize, INPUT_SIZE.0 as usize),
            chw,
        )
        .map_err(|e| Error::DataQuality(format!("building input tensor: {e}")))?;
        let input = Value::from_array(array)
            .map_err(|e| Error::DataQuality(format!("wrapping input tensor: {e}")))?;

        let outputs = self
            .session
            .run(vec![input])
            .map_err(|e| Error::DataQuality(format!("inference failed: {e}")))?;

        let output = outputs
            .first()
            .ok_or_else(|| Error::DataQuality("model produced no outputs".to_string()))?;
        let tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::DataQuality(format!("extracting output tensor: {e}")))?;

        Ok(self.postprocess(&tensor.view(), frame))
    }
}
