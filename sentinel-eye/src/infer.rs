//! Inference provider contract
//!
//! The pipeline is generic over where detections come from: the ONNX
//! backend (`onnx` feature), a scripted replay for tests and demos, or a
//! mock. `ModelUnavailable` is fatal to the stream; any other provider
//! error skips the frame.

use crate::frame::Frame;
use parking_lot::Mutex;
use sentinel_core::{BoundingBox, Detection, Result, WeaponClass};

#[cfg_attr(test, mockall::automock)]
pub trait InferenceProvider: Send + Sync {
    /// Detect weapons in one frame. Returns at most a handful of boxes;
    /// detection quality filtering happens downstream.
    fn detect(&self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// Replays a fixed per-frame schedule of `(class, confidence)` pairs.
/// Frames beyond the schedule yield no detections unless `cycle` is set.
pub struct ScriptedProvider {
    script: Vec<Vec<(WeaponClass, f32)>>,
    cursor: Mutex<usize>,
    cycle: bool,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Vec<(WeaponClass, f32)>>) -> Self {
        Self {
            script,
            cursor: Mutex::new(0),
            cycle: false,
        }
    }

    /// Loop the schedule forever instead of going quiet at the end.
    pub fn cycling(script: Vec<Vec<(WeaponClass, f32)>>) -> Self {
        Self {
            script,
            cursor: Mutex::new(0),
            cycle: true,
        }
    }

    /// A demo schedule: a few quiet frames, then a pistol burst long
    /// enough to get through any sane debounce, then quiet again.
    pub fn demo() -> Self {
        let mut script: Vec<Vec<(WeaponClass, f32)>> = vec![Vec::new(); 10];
        script.extend(std::iter::repeat(vec![(WeaponClass::Pistol, 0.97)]).take(8));
        script.extend(std::iter::repeat(Vec::new()).take(30));
        Self::cycling(script)
    }
}

impl InferenceProvider for ScriptedProvider {
    fn detect(&self, frame: &Frame) -> Result<Vec<Detection>> {
        let mut cursor = self.cursor.lock();
        let index = *cursor;
        let step = if self.cycle && !self.script.is_empty() {
            self.script.get(index % self.script.len())
        } else {
            self.script.get(index)
        };
        *cursor = cursor.wrapping_add(1);

        let center = (frame.width() as f32 / 4.0, frame.height() as f32 / 4.0);
        Ok(step
            .map(|specs| {
                specs
                    .iter()
                    .map(|(class, confidence)| Detection {
                        class: *class,
                        confidence: *confidence,
                        bbox: BoundingBox::new(center.0, center.1, 48.0, 48.0),
                        observed_at: frame.captured_at,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Greedy non-maximum suppression: keep the highest-confidence box and drop
/// anything overlapping it past `iou_threshold`.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    if detections.is_empty() {
        return detections;
    }

    detections.retain(|d| d.is_well_formed());
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(detections[i].clone());
        for j in (i + 1)..detections.len() {
            if suppressed[j] {
                continue;
            }
            if detections[i].bbox.iou(&detections[j].bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}
