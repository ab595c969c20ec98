//! # Geometry Primitives
//!
//! World (meters) and image (pixels) coordinates, plus axis-aligned boxes.

use serde::{Deserialize, Serialize};

/// A point in simulator world coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in meters.
    pub fn distance_to(&self, other: &WorldPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A point in image coordinates; origin is the top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PixelPoint {
    pub x: i64,
    pub y: i64,
}

impl PixelPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to a sub-pixel position.
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x as f64 - x).hypot(self.y as f64 - y)
    }
}

/// Output image resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Largest valid x coordinate.
    pub fn max_x(&self) -> f64 {
        f64::from(self.width.saturating_sub(1))
    }

    /// Largest valid y coordinate.
    pub fn max_y(&self) -> f64 {
        f64::from(self.height.saturating_sub(1))
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::new(800, 800)
    }
}

/// Rectangular area of the simulated world mapped onto the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl WorldBounds {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Bounds must span a positive, finite area.
    pub fn is_valid(&self) -> bool {
        self.width().is_finite() && self.height().is_finite() && self.width() > 0.0 && self.height() > 0.0
    }

    pub fn contains(&self, point: &WorldPoint) -> bool {
        point.x >= self.xmin && point.x <= self.xmax && point.y >= self.ymin && point.y <= self.ymax
    }
}

/// Axis-aligned box in pixel coordinates, stored as top-left / bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Area, zero for degenerate boxes.
    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Intersection over union; 0 when either box is empty.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// `(top-left x, top-left y, width, height)`.
    pub fn to_tlwh(&self) -> [f64; 4] {
        [self.x1, self.y1, self.width(), self.height()]
    }

    /// `(center x, center y, aspect ratio w/h, height)`, the Kalman measurement space.
    pub fn to_xyah(&self) -> [f64; 4] {
        let (cx, cy) = self.center();
        let h = self.height();
        let a = if h != 0.0 { self.width() / h } else { 0.0 };
        [cx, cy, a, h]
    }

    /// Inverse of [`BoundingBox::to_xyah`].
    pub fn from_xyah(xyah: [f64; 4]) -> Self {
        let [cx, cy, a, h] = xyah;
        let w = a * h;
        Self::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    /// Clamp to the image area.
    pub fn clamp_to(&self, size: &ImageSize) -> Self {
        Self::new(
            self.x1.max(0.0),
            self.y1.max(0.0),
            self.x2.min(size.max_x()),
            self.y2.min(size.max_y()),
        )
    }

    /// Corners truncated to whole pixels.
    pub fn to_pixels(&self) -> [i64; 4] {
        [
            self.x1 as i64,
            self.y1 as i64,
            self.x2 as i64,
            self.y2 as i64,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical_and_disjoint() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-12);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_half_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        // intersection 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_xyah_roundtrip() {
        let b = BoundingBox::new(10.0, 20.0, 34.0, 32.0);
        let back = BoundingBox::from_xyah(b.to_xyah());
        assert!((back.x1 - b.x1).abs() < 1e-9);
        assert!((back.y2 - b.y2).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_to_image() {
        let size = ImageSize::new(100, 50);
        let b = BoundingBox::new(-5.0, -1.0, 120.0, 60.0).clamp_to(&size);
        assert_eq!(b, BoundingBox::new(0.0, 0.0, 99.0, 49.0));
    }

    #[test]
    fn test_bounds_validity() {
        assert!(WorldBounds::new(0.0, 0.0, 10.0, 10.0).is_valid());
        assert!(!WorldBounds::new(0.0, 0.0, 0.0, 10.0).is_valid());
    }
}
