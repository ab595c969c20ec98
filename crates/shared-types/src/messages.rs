//! # V2X Message Types
//!
//! Cooperative-awareness style messages built from tracked vehicles.
//! These are the payloads archived to disk and transmitted over UDP.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::VehicleId;
use crate::geometry::WorldPoint;

/// Kind of message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Cooperative Awareness Message: plain per-frame report.
    #[serde(rename = "CAM")]
    Cam,
    /// Report broadcast from the ego vehicle's perspective.
    #[serde(rename = "V2X_BROADCAST")]
    V2xBroadcast,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cam => "CAM",
            Self::V2xBroadcast => "V2X_BROADCAST",
        }
    }
}

/// Per-vehicle classification attached to reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum V2xReportType {
    /// Vulnerable road user (pedestrian).
    Vru,
    /// Vehicle below 0.5 m/s.
    CamStationary,
    /// Vehicle above 15 m/s.
    CamHighSpeed,
    /// Everything else.
    CamNormal,
}

impl V2xReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vru => "VRU",
            Self::CamStationary => "CAM_STATIONARY",
            Self::CamHighSpeed => "CAM_HIGH_SPEED",
            Self::CamNormal => "CAM_NORMAL",
        }
    }
}

/// One tracked vehicle inside a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V2xVehicleReport {
    /// Track id.
    pub id: u64,
    /// Matched simulator vehicle, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sumo_id: Option<VehicleId>,
    /// Pixel box `[x1, y1, x2, y2]`.
    pub bbox: [i64; 4],
    /// Class name, `unknown` for unmapped ids.
    pub class: String,
    pub class_id: u8,
    pub confidence: f64,
    /// Simulation timestamp the report was built for.
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<WorldPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v2x_type: Option<V2xReportType>,
}

/// A complete V2X message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct V2xMessage {
    pub message_id: Uuid,
    /// Simulation timestamp.
    pub timestamp: f64,
    pub message_type: MessageType,
    pub vehicles: Vec<V2xVehicleReport>,
    pub total_vehicles: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ego_vehicle: Option<VehicleId>,
    /// Nominal communication range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_vehicles: Option<Vec<V2xVehicleReport>>,
    /// Pipeline frame counter at emission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_frame: Option<u64>,
}

impl V2xMessage {
    /// Create a message of the given type with a fresh id.
    pub fn new(message_type: MessageType, timestamp: f64, vehicles: Vec<V2xVehicleReport>) -> Self {
        let total_vehicles = vehicles.len();
        Self {
            message_id: Uuid::new_v4(),
            timestamp,
            message_type,
            vehicles,
            total_vehicles,
            ego_vehicle: None,
            range_km: None,
            nearby_vehicles: None,
            pipeline_frame: None,
        }
    }
}
