//! Domain types exchanged across the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use uuid::Uuid;

/// Weapon classes the pretrained model is trained to flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponClass {
    Pistol,
    Knife,
}

impl WeaponClass {
    /// All classes the pipeline tracks, in a stable order.
    pub const ALL: [WeaponClass; 2] = [WeaponClass::Pistol, WeaponClass::Knife];

    pub fn label(&self) -> &'static str {
        match self {
            WeaponClass::Pistol => "pistol",
            WeaponClass::Knife => "knife",
        }
    }
}

impl fmt::Display for WeaponClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WeaponClass {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pistol" => Ok(WeaponClass::Pistol),
            "knife" => Ok(WeaponClass::Knife),
            other => Err(crate::Error::DataQuality(format!(
                "unknown class label: {other}"
            ))),
        }
    }
}

/// Axis-aligned bounding box in pixel coordinates (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Finite coordinates with non-negative extents.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.w.is_finite()
            && self.h.is_finite()
            && self.w >= 0.0
            && self.h >= 0.0
    }

    /// Clamp the box into a `width` x `height` frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> BoundingBox {
        let fw = width as f32;
        let fh = height as f32;
        let x = self.x.max(0.0).min(fw);
        let y = self.y.max(0.0).min(fh);
        BoundingBox {
            x,
            y,
            w: self.w.max(0.0).min(fw - x),
            h: self.h.max(0.0).min(fh - y),
        }
    }

    /// Intersection over union with another box. Invalid inputs score 0.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        if !self.is_valid() || !other.is_valid() {
            return 0.0;
        }

        let inter_x_min = self.x.max(other.x);
        let inter_y_min = self.y.max(other.y);
        let inter_x_max = (self.x + self.w).min(other.x + other.w);
        let inter_y_max = (self.y + self.h).min(other.y + other.h);

        if inter_x_max <= inter_x_min || inter_y_max <= inter_y_min {
            return 0.0;
        }

        let inter_area = (inter_x_max - inter_x_min) * (inter_y_max - inter_y_min);
        let union_area = self.w * self.h + other.w * other.h - inter_area;

        if union_area <= 0.0 || !union_area.is_finite() {
            return 0.0;
        }

        let iou = inter_area / union_area;
        if iou.is_finite() && (0.0..=1.0).contains(&iou) {
            iou
        } else {
            0.0
        }
    }
}

/// One detected object in one frame. Produced by the inference provider,
/// consumed by the alert engine, then discarded.
#[derive(Debug, Clone)]
pub struct Detection {
    pub class: WeaponClass,
    pub confidence: f32,
    pub bbox: BoundingBox,
    /// Monotonic timestamp of the frame the detection came from.
    pub observed_at: Instant,
}

impl Detection {
    /// Confidence within [0, 1] and a valid bounding box. Anything else is
    /// a data-quality problem and never reaches the alert state.
    pub fn is_well_formed(&self) -> bool {
        self.confidence.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
            && self.bbox.is_valid()
    }
}

/// Emitted exactly once per inactive-to-active alert transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub class: WeaponClass,
    pub confidence: f32,
    /// Where the annotated snapshot will be written, if snapshots are on.
    pub snapshot: Option<PathBuf>,
    pub raised_at: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(class: WeaponClass, confidence: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            class,
            confidence,
            snapshot: None,
            raised_at: Utc::now(),
        }
    }
}
