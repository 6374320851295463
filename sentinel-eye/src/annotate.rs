//! Frame annotation for alert snapshots
//!
//! Draws class-colored detection boxes and, when anything was detected, a
//! red full-frame border, directly on the RGB buffer.

use image::{Rgb, RgbImage};
use sentinel_core::{Detection, WeaponClass};

const BOX_THICKNESS: u32 = 3;
const BORDER_THICKNESS: u32 = 10;

fn class_color(class: WeaponClass) -> Rgb<u8> {
    match class {
        WeaponClass::Pistol => Rgb([255, 0, 0]),
        WeaponClass::Knife => Rgb([255, 165, 0]),
    }
}

/// Draw every detection onto the frame, plus the alert border if any box
/// was drawn.
pub fn annotate(image: &mut RgbImage, detections: &[Detection]) {
    let mut drew_any = false;
    for det in detections {
        if !det.bbox.is_valid() {
            continue;
        }
        let clamped = det.bbox.clamp_to(image.width(), image.height());
        if clamped.w <= 0.0 || clamped.h <= 0.0 {
            continue;
        }
        draw_rect(
            image,
            clamped.x as u32,
            clamped.y as u32,
            clamped.w as u32,
            clamped.h as u32,
            class_color(det.class),
            BOX_THICKNESS,
        );
        drew_any = true;
    }

    if drew_any {
        draw_rect(
            image,
            0,
            0,
            image.width(),
            image.height(),
            Rgb([255, 0, 0]),
            BORDER_THICKNESS,
        );
    }
}

/// Hollow rectangle with the given edge thickness, clipped to the image.
fn draw_rect(image: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>, thickness: u32) {
    let (iw, ih) = (image.width(), image.height());
    if iw == 0 || ih == 0 || w == 0 || h == 0 {
        return;
    }
    let x1 = (x + w).min(iw);
    let y1 = (y + h).min(ih);
    let t = thickness.max(1);

    for py in y..y1 {
        for px in x..x1 {
            let on_edge = px < x + t || px >= x1.saturating_sub(t) || py < y + t
                || py >= y1.saturating_sub(t);
            if on_edge {
                image.put_pixel(px, py, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::BoundingBox;
    use std::time::Instant;

    fn det(class: WeaponClass, bbox: BoundingBox) -> Detection {
        Detection {
            class,
            confidence: 0.9,
            bbox,
            observed_at: Instant::now(),
        }
    }

    #[test]
    fn test_box_and_border_drawn() {
        let mut image = RgbImage::new(100, 100);
        annotate(
            &mut image,
            &[det(WeaponClass::Pistol, BoundingBox::new(30.0, 30.0, 20.0, 20.0))],
        );

        // Box edge is pistol red.
        assert_eq!(*image.get_pixel(30, 30), Rgb([255, 0, 0]));
        // Alert border covers the frame corner.
        assert_eq!(*image.get_pixel(0, 0), Rgb([255, 0, 0]));
        // Box interior stays untouched.
        assert_eq!(*image.get_pixel(40, 40), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_knife_uses_orange() {
        let mut image = RgbImage::new(100, 100);
        annotate(
            &mut image,
            &[det(WeaponClass::Knife, BoundingBox::new(40.0, 40.0, 30.0, 30.0))],
        );
        assert_eq!(*image.get_pixel(41, 41), Rgb([255, 165, 0]));
    }

    #[test]
    fn test_no_detections_leaves_frame_untouched() {
        let mut image = RgbImage::new(50, 50);
        annotate(&mut image, &[]);
        assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(25, 25), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_out_of_frame_box_is_clipped() {
        let mut image = RgbImage::new(50, 50);
        annotate(
            &mut image,
            &[det(WeaponClass::Pistol, BoundingBox::new(-20.0, -20.0, 1000.0, 1000.0))],
        );
        // Clamped to the frame; no panic, border drawn.
        assert_eq!(*image.get_pixel(0, 0), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_invalid_box_skipped() {
        let mut image = RgbImage::new(50, 50);
        annotate(
            &mut image,
            &[det(WeaponClass::Pistol, BoundingBox::new(f32::NAN, 0.0, 10.0, 10.0))],
        );
        // Nothing drawn at all, not even the border.
        assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 0]));
    }
}
