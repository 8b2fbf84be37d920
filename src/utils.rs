//! Utility functions for coordinate handling.

pub mod safe_cast;

use crate::landmarks::LandmarkSet;
use safe_cast::{f64_to_i32_clamp, u32_to_i32};
use serde::{Deserialize, Serialize};

/// Axis aligned box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Bounding box of all face landmarks, padded and clamped to the frame
///
/// The padding is a fraction of the shorter frame side, so the same value
/// gives a visually similar margin in portrait and landscape frames.
/// Returns `None` for an empty landmark set or a frame too large for `i32`.
pub fn face_bounding_box(face: &LandmarkSet, width: u32, height: u32, padding: f64) -> Option<BoundingBox> {
    let max_width = u32_to_i32(width).ok()?;
    let max_height = u32_to_i32(height).ok()?;

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for point in face.iter() {
        let (px, py) = point.to_pixels(width, height);
        min_x = min_x.min(px);
        min_y = min_y.min(py);
        max_x = max_x.max(px);
        max_y = max_y.max(py);
    }
    if !min_x.is_finite() {
        return None;
    }

    let pad = f64::from(width.min(height)) * padding;
    let x0 = f64_to_i32_clamp(min_x - pad, 0, max_width);
    let y0 = f64_to_i32_clamp(min_y - pad, 0, max_height);
    let x1 = f64_to_i32_clamp(max_x + pad, 0, max_width);
    let y1 = f64_to_i32_clamp(max_y + pad, 0, max_height);

    Some(BoundingBox {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;

    #[test]
    fn test_face_bounding_box_padding() {
        let face = LandmarkSet::new(vec![Landmark::new(0.25, 0.25), Landmark::new(0.75, 0.5)]);
        // 640x480, padding 0.1 of 480 = 48 px
        let bbox = face_bounding_box(&face, 640, 480, 0.1).unwrap();
        assert_eq!(bbox, BoundingBox { x: 112, y: 72, width: 416, height: 216 });
    }

    #[test]
    fn test_face_bounding_box_clamped_to_frame() {
        let face = LandmarkSet::new(vec![Landmark::new(0.01, 0.02), Landmark::new(0.99, 0.98)]);
        let bbox = face_bounding_box(&face, 200, 100, 0.5).unwrap();
        assert_eq!(bbox.x, 0);
        assert_eq!(bbox.y, 0);
        assert_eq!(bbox.x + bbox.width, 200);
        assert_eq!(bbox.y + bbox.height, 100);
    }

    #[test]
    fn test_face_bounding_box_empty() {
        assert!(face_bounding_box(&LandmarkSet::default(), 640, 480, 0.1).is_none());
    }
}
