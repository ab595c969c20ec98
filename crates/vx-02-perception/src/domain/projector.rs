//! Top-down projection of simulator coordinates onto image pixels.
//!
//! The world area is mapped linearly onto `[0, W-1] × [0, H-1]` with the y
//! axis flipped, so increasing world y moves up the image. Once the bounds
//! are known they never change, which keeps pixel positions comparable
//! across frames for the tracker.

use shared_types::{BoundingBox, Detection, ImageSize, PixelPoint, VehicleState, WorldBounds};
use tracing::info;

use crate::domain::config::{invalid_bounds, PerceptionConfig};
use crate::error::PerceptionError;

#[derive(Debug, Clone, PartialEq)]
pub struct WorldProjector {
    bounds: Option<WorldBounds>,
    image_size: ImageSize,
    margin_m: f64,
    default_bbox_size_m: f64,
}

impl WorldProjector {
    pub fn new(config: &PerceptionConfig) -> Self {
        Self {
            bounds: config.world_bounds,
            image_size: config.image_size,
            margin_m: config.bounds_margin_m,
            default_bbox_size_m: config.default_bbox_size_m,
        }
    }

    pub fn bounds(&self) -> Option<WorldBounds> {
        self.bounds
    }

    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    /// Fit bounds around `vehicles` plus the configured margin and freeze them.
    pub fn compute_world_bounds(
        &mut self,
        vehicles: &[VehicleState],
    ) -> Result<WorldBounds, PerceptionError> {
        let first = vehicles.first().ok_or(PerceptionError::NoVehicles)?;
        let (mut xmin, mut ymin, mut xmax, mut ymax) = (first.x, first.y, first.x, first.y);
        for v in &vehicles[1..] {
            xmin = xmin.min(v.x);
            ymin = ymin.min(v.y);
            xmax = xmax.max(v.x);
            ymax = ymax.max(v.y);
        }

        let m = self.margin_m;
        let bounds = WorldBounds::new(xmin - m, ymin - m, xmax + m, ymax + m);
        if !bounds.is_valid() {
            return Err(invalid_bounds(&bounds));
        }

        info!(
            xmin = bounds.xmin,
            ymin = bounds.ymin,
            xmax = bounds.xmax,
            ymax = bounds.ymax,
            "World bounds computed"
        );
        self.bounds = Some(bounds);
        Ok(bounds)
    }

    /// Known bounds, computing them from `vehicles` on first use.
    pub fn ensure_bounds(
        &mut self,
        vehicles: &[VehicleState],
    ) -> Result<WorldBounds, PerceptionError> {
        match self.bounds {
            Some(bounds) => Ok(bounds),
            None => self.compute_world_bounds(vehicles),
        }
    }

    /// Map world meters to pixels. Points outside the bounds land outside the image.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Result<PixelPoint, PerceptionError> {
        let b = self.bounds.ok_or(PerceptionError::BoundsUnknown)?;
        let nx = (x - b.xmin) / b.width();
        let ny = (y - b.ymin) / b.height();
        let px = (nx * self.image_size.max_x()) as i64;
        let py = ((1.0 - ny) * self.image_size.max_y()) as i64;
        Ok(PixelPoint::new(px, py))
    }

    /// Same-sized boxes for every vehicle, scaled from `default_bbox_size_m`.
    pub fn uniform_detections(
        &mut self,
        vehicles: &[VehicleState],
        confidence: f64,
        class_id: u8,
    ) -> Result<Vec<Detection>, PerceptionError> {
        if vehicles.is_empty() {
            return Ok(Vec::new());
        }
        let bounds = self.ensure_bounds(vehicles)?;

        let meters_to_px = f64::from(self.image_size.width) / bounds.width();
        let half_w = ((self.default_bbox_size_m * meters_to_px) / 2.0).trunc();
        let half_h = (half_w * 0.6).trunc();

        vehicles
            .iter()
            .map(|v| {
                let p = self.world_to_pixel(v.x, v.y)?;
                let (px, py) = (p.x as f64, p.y as f64);
                let bbox = BoundingBox::new(px - half_w, py - half_h, px + half_w, py + half_h)
                    .clamp_to(&self.image_size);
                Ok(Detection::new(bbox, confidence, class_id))
            })
            .collect()
    }
}
