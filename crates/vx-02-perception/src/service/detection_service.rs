//! Detection Service
//!
//! Ground-truth detections: every simulated vehicle becomes a box with
//! confidence 1.0.

use shared_types::{BoundingBox, Detection, ObjectClass, SimulationFrame, VehicleState};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::{
    class_for_sumo_class, half_size, infer_class_from_id, DetectionMode, PerceptionConfig,
    WorldProjector,
};
use crate::error::PerceptionError;
use crate::ports::DetectionApi;

/// Confidence of simulator-derived detections.
pub const GROUND_TRUTH_CONFIDENCE: f64 = 1.0;

/// Implements [`DetectionApi`] on top of a [`WorldProjector`].
#[derive(Debug, Clone)]
pub struct DetectionService {
    config: PerceptionConfig,
    projector: WorldProjector,
}

impl DetectionService {
    pub fn new(config: PerceptionConfig) -> Result<Self, PerceptionError> {
        config.validate()?;
        let projector = WorldProjector::new(&config);
        Ok(Self { config, projector })
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    /// Detector class for a vehicle.
    pub fn class_of(&self, vehicle: &VehicleState) -> u8 {
        match vehicle.vehicle_class.as_deref() {
            Some(sumo_class) => class_for_sumo_class(&self.config.vehicle_types, sumo_class),
            None => infer_class_from_id(vehicle.id.as_str()).id(),
        }
    }

    fn class_aware(&self, vehicles: &[VehicleState]) -> Result<Vec<Detection>, PerceptionError> {
        let size = self.projector.image_size();
        vehicles
            .iter()
            .map(|v| {
                let class_id = self.class_of(v);
                let p = self.projector.world_to_pixel(v.x, v.y)?;
                let (half_w, half_h) = half_size(class_id, v.speed);
                let (px, py) = (p.x as f64, p.y as f64);
                let bbox = BoundingBox::new(px - half_w, py - half_h, px + half_w, py + half_h)
                    .clamp_to(&size);
                Ok(Detection::new(bbox, GROUND_TRUTH_CONFIDENCE, class_id))
            })
            .collect()
    }
}

impl DetectionApi for DetectionService {
    fn detect(&mut self, frame: &SimulationFrame) -> Result<Vec<Detection>, PerceptionError> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        self.projector.ensure_bounds(&frame.vehicles)?;

        let detections = match self.config.detection_mode {
            DetectionMode::ClassAware => self.class_aware(&frame.vehicles)?,
            DetectionMode::Uniform => self.projector.uniform_detections(
                &frame.vehicles,
                GROUND_TRUTH_CONFIDENCE,
                ObjectClass::Car.id(),
            )?,
        };
        debug!(step = frame.step, detections = detections.len(), "Detections produced");
        Ok(detections)
    }

    fn class_names(&self) -> BTreeMap<u8, &'static str> {
        ObjectClass::ALL.iter().map(|c| (c.id(), c.name())).collect()
    }

    fn projector(&self) -> &WorldProjector {
        &self.projector
    }
}
