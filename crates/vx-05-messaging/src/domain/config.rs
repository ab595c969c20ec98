//! Messaging configuration

use serde::{Deserialize, Serialize};
use shared_types::VehicleId;

use crate::error::MessagingError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Vehicle whose perspective broadcasts are built from.
    pub ego_vehicle_id: Option<VehicleId>,
    /// Radio range used for the nearby filter (meters).
    pub v2x_range_m: f64,
    /// Broadcast every N pipeline frames.
    pub broadcast_interval: u64,
    /// `host:port` to send broadcasts to over UDP.
    pub udp_target: Option<String>,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            ego_vehicle_id: Some(VehicleId::new("veh_0")),
            v2x_range_m: 300.0,
            broadcast_interval: 5,
            udp_target: None,
        }
    }
}

impl MessagingConfig {
    pub fn validate(&self) -> Result<(), MessagingError> {
        if self.broadcast_interval == 0 {
            return Err(MessagingError::InvalidConfig(
                "broadcast_interval must be at least 1".into(),
            ));
        }
        if !(self.v2x_range_m.is_finite() && self.v2x_range_m > 0.0) {
            return Err(MessagingError::InvalidConfig(format!(
                "v2x_range_m must be positive, got {}",
                self.v2x_range_m
            )));
        }
        if let Some(target) = &self.udp_target {
            if target.trim().is_empty() {
                return Err(MessagingError::InvalidConfig("udp_target is empty".into()));
            }
        }
        Ok(())
    }

    /// Whether the pipeline broadcasts on this frame (frame 0 included).
    pub fn is_broadcast_frame(&self, frame: u64) -> bool {
        self.broadcast_interval > 0 && frame % self.broadcast_interval == 0
    }

    /// Range in kilometres as carried in broadcast messages.
    pub fn range_km(&self) -> f64 {
        self.v2x_range_m / 1000.0
    }

    pub fn with_ego_vehicle(mut self, id: impl Into<String>) -> Self {
        self.ego_vehicle_id = Some(VehicleId::new(id));
        self
    }

    pub fn with_range(mut self, meters: f64) -> Self {
        self.v2x_range_m = meters;
        self
    }

    pub fn with_broadcast_interval(mut self, frames: u64) -> Self {
        self.broadcast_interval = frames;
        self
    }

    pub fn with_udp_target(mut self, target: impl Into<String>) -> Self {
        self.udp_target = Some(target.into());
        self
    }
}
