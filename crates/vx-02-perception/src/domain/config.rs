//! Perception configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use vx_02_perception::domain::{DetectionMode, PerceptionConfig};
//! use shared_types::ImageSize;
//!
//! let config = PerceptionConfig::default()
//!     .with_image_size(ImageSize::new(1200, 800))
//!     .with_detection_mode(DetectionMode::Uniform);
//! config.validate()?;
//! ```

use serde::{Deserialize, Serialize};
use shared_types::{ImageSize, WorldBounds};
use std::collections::BTreeMap;

use crate::error::PerceptionError;

/// How vehicles are turned into boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Per-class box sizes, grown with speed.
    #[default]
    ClassAware,
    /// One box size for every vehicle, derived from `default_bbox_size_m`.
    Uniform,
}

/// Simulator vehicle class → detector class id.
pub fn default_vehicle_types() -> BTreeMap<String, u8> {
    [
        ("passenger", 1),
        ("truck", 2),
        ("bus", 3),
        ("motorcycle", 4),
        ("bicycle", 5),
        ("pedestrian", 0),
    ]
    .into_iter()
    .map(|(name, id)| (name.to_string(), id))
    .collect()
}

/// Perception configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Fixed world area; computed from the first populated frame when absent.
    pub world_bounds: Option<WorldBounds>,
    /// Output image resolution
    pub image_size: ImageSize,
    /// Vehicle length used by uniform detections (meters)
    pub default_bbox_size_m: f64,
    /// Margin added around computed bounds (meters)
    pub bounds_margin_m: f64,
    pub vehicle_types: BTreeMap<String, u8>,
    pub detection_mode: DetectionMode,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            world_bounds: None,
            image_size: ImageSize::default(),
            default_bbox_size_m: 2.0,
            bounds_margin_m: 10.0,
            vehicle_types: default_vehicle_types(),
            detection_mode: DetectionMode::default(),
        }
    }
}

impl PerceptionConfig {
    pub fn validate(&self) -> Result<(), PerceptionError> {
        if self.image_size.width < 2 || self.image_size.height < 2 {
            return Err(PerceptionError::InvalidConfig(format!(
                "image size must be at least 2x2, got {}x{}",
                self.image_size.width, self.image_size.height
            )));
        }

        if !(self.default_bbox_size_m.is_finite() && self.default_bbox_size_m > 0.0) {
            return Err(PerceptionError::InvalidConfig(format!(
                "default_bbox_size_m must be positive, got {}",
                self.default_bbox_size_m
            )));
        }

        if !(self.bounds_margin_m.is_finite() && self.bounds_margin_m >= 0.0) {
            return Err(PerceptionError::InvalidConfig(format!(
                "bounds_margin_m cannot be negative, got {}",
                self.bounds_margin_m
            )));
        }

        if let Some(bounds) = &self.world_bounds {
            if !bounds.is_valid() {
                return Err(invalid_bounds(bounds));
            }
        }

        Ok(())
    }

    /// Builder-style method to pin the world area
    pub fn with_world_bounds(mut self, bounds: WorldBounds) -> Self {
        self.world_bounds = Some(bounds);
        self
    }

    /// Builder-style method to set the image resolution
    pub fn with_image_size(mut self, size: ImageSize) -> Self {
        self.image_size = size;
        self
    }

    pub fn with_detection_mode(mut self, mode: DetectionMode) -> Self {
        self.detection_mode = mode;
        self
    }

    pub fn with_vehicle_type(mut self, sumo_class: impl Into<String>, class_id: u8) -> Self {
        self.vehicle_types.insert(sumo_class.into(), class_id);
        self
    }
}

pub(crate) fn invalid_bounds(bounds: &WorldBounds) -> PerceptionError {
    PerceptionError::InvalidBounds {
        xmin: bounds.xmin,
        ymin: bounds.ymin,
        xmax: bounds.xmax,
        ymax: bounds.ymax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PerceptionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.vehicle_types.get("pedestrian"), Some(&0));
        assert_eq!(config.detection_mode, DetectionMode::ClassAware);
    }

    #[test]
    fn test_rejects_tiny_image() {
        let config = PerceptionConfig::default().with_image_size(ImageSize::new(1, 800));
        assert!(matches!(
            config.validate(),
            Err(PerceptionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_degenerate_bounds() {
        let config =
            PerceptionConfig::default().with_world_bounds(WorldBounds::new(5.0, 0.0, 5.0, 10.0));
        assert!(matches!(
            config.validate(),
            Err(PerceptionError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_box_size() {
        let config = PerceptionConfig {
            default_bbox_size_m: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: PerceptionConfig = toml::from_str(
            r#"
            detection_mode = "uniform"

            [image_size]
            width = 1200
            height = 800
            "#,
        )
        .unwrap();
        assert_eq!(config.detection_mode, DetectionMode::Uniform);
        assert_eq!(config.image_size, ImageSize::new(1200, 800));
        assert_eq!(config.default_bbox_size_m, 2.0);
        assert_eq!(config.vehicle_types.len(), 6);
    }
}
