//! # Core Domain Entities
//!
//! Defines the entities that flow through the V2X pipeline.
//!
//! ## Clusters
//!
//! - **Simulation**: `VehicleId`, `VehicleState`, `SimulationFrame`
//! - **Perception**: `ObjectClass`, `Detection`
//! - **Tracking**: `TrackSnapshot`
//! - **Runtime**: `SubsystemId`

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::{BoundingBox, WorldPoint};

// =============================================================================
// CLUSTER A: SIMULATION
// =============================================================================

/// Identifier of a vehicle as assigned by the traffic simulator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct VehicleId(pub String);

impl VehicleId {
    /// Create a vehicle id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VehicleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for VehicleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The observed state of one vehicle at one simulation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Simulator vehicle id.
    pub id: VehicleId,
    /// World x coordinate (meters).
    pub x: f64,
    /// World y coordinate (meters).
    pub y: f64,
    /// Speed (m/s).
    pub speed: f64,
    /// Heading in degrees as reported by the simulator.
    pub angle: f64,
    /// Simulator vehicle class (`passenger`, `truck`, ...), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_class: Option<String>,
    /// Edge (road) the vehicle is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_id: Option<String>,
    /// Lane the vehicle is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane_id: Option<String>,
    /// Longitudinal acceleration (m/s²).
    #[serde(default)]
    pub acceleration: f64,
}

impl VehicleState {
    /// Create a vehicle state with position and motion only.
    pub fn new(id: impl Into<VehicleId>, x: f64, y: f64, speed: f64, angle: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            speed,
            angle,
            vehicle_class: None,
            road_id: None,
            lane_id: None,
            acceleration: 0.0,
        }
    }

    /// Builder-style method to set the simulator class.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.vehicle_class = Some(class.into());
        self
    }

    /// Builder-style method to set road and lane.
    pub fn with_lane(mut self, road: impl Into<String>, lane: impl Into<String>) -> Self {
        self.road_id = Some(road.into());
        self.lane_id = Some(lane.into());
        self
    }

    /// Builder-style method to set acceleration.
    pub fn with_acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// World position of the vehicle.
    pub fn position(&self) -> WorldPoint {
        WorldPoint::new(self.x, self.y)
    }

    /// Euclidean distance to another vehicle (meters).
    pub fn distance_to(&self, other: &VehicleState) -> f64 {
        self.position().distance_to(&other.position())
    }
}

/// All vehicles reported by the simulator for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SimulationFrame {
    /// Step counter, starting at 0.
    pub step: u64,
    /// Simulation time in seconds.
    pub time_s: f64,
    /// Vehicles present during this step.
    pub vehicles: Vec<VehicleState>,
}

impl SimulationFrame {
    /// Create a frame.
    pub fn new(step: u64, time_s: f64, vehicles: Vec<VehicleState>) -> Self {
        Self {
            step,
            time_s,
            vehicles,
        }
    }

    /// Look up a vehicle by id.
    pub fn vehicle(&self, id: &VehicleId) -> Option<&VehicleState> {
        self.vehicles.iter().find(|v| &v.id == id)
    }

    /// Whether the frame contains no vehicles.
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

// =============================================================================
// CLUSTER B: PERCEPTION
// =============================================================================

/// Object classes understood by the perception and messaging layers.
///
/// The numeric ids follow the detector class table used throughout the
/// pipeline (0 = person ... 5 = bicycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObjectClass {
    Person = 0,
    Car = 1,
    Truck = 2,
    Bus = 3,
    Motorcycle = 4,
    Bicycle = 5,
}

impl ObjectClass {
    /// All classes in id order.
    pub const ALL: [ObjectClass; 6] = [
        ObjectClass::Person,
        ObjectClass::Car,
        ObjectClass::Truck,
        ObjectClass::Bus,
        ObjectClass::Motorcycle,
        ObjectClass::Bicycle,
    ];

    /// Resolve a class id.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Numeric class id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Lowercase class name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Car => "car",
            Self::Truck => "truck",
            Self::Bus => "bus",
            Self::Motorcycle => "motorcycle",
            Self::Bicycle => "bicycle",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single detection: pixel box, confidence and class id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Box in image pixels.
    pub bbox: BoundingBox,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f64,
    /// Class id (see [`ObjectClass`]).
    pub class_id: u8,
}

impl Detection {
    /// Create a detection.
    pub fn new(bbox: BoundingBox, confidence: f64, class_id: u8) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
        }
    }
}

// =============================================================================
// CLUSTER C: TRACKING
// =============================================================================

/// Published state of a confirmed track for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    /// Tracker-assigned id, unique per tracker, starting at 1.
    pub track_id: u64,
    /// Current box estimate.
    pub bbox: BoundingBox,
    /// Score of the last associated detection.
    pub score: f64,
    /// Class id of the last associated detection.
    pub class_id: u8,
    /// Box center in pixels.
    pub center: [f64; 2],
    /// Tracker frame counter when this snapshot was produced.
    pub frame: u64,
    /// Whether the track has been activated.
    pub is_confirmed: bool,
    /// Number of frames the track has been matched.
    pub track_len: u32,
    /// Matched simulator vehicle.
    pub sumo_id: Option<VehicleId>,
    /// World position of the matched vehicle.
    pub world_position: Option<WorldPoint>,
    /// Speed of the matched vehicle (m/s).
    pub speed: f64,
    /// Heading of the matched vehicle (degrees).
    pub angle: f64,
    /// Acceleration derived from speed history (m/s²).
    pub acceleration: f64,
    /// Unit heading vector `(cos θ, sin θ)`.
    pub direction_vector: [f64; 2],
    /// Whether simulator ground truth was attached.
    pub has_sumo_data: bool,
}

impl TrackSnapshot {
    /// Create a snapshot without simulator data.
    pub fn new(track_id: u64, bbox: BoundingBox, score: f64, class_id: u8, frame: u64) -> Self {
        let (cx, cy) = bbox.center();
        Self {
            track_id,
            bbox,
            score,
            class_id,
            center: [cx, cy],
            frame,
            is_confirmed: true,
            track_len: 0,
            sumo_id: None,
            world_position: None,
            speed: 0.0,
            angle: 0.0,
            acceleration: 0.0,
            direction_vector: [0.0, 0.0],
            has_sumo_data: false,
        }
    }
}

// =============================================================================
// CLUSTER D: RUNTIME
// =============================================================================

/// Identifiers of the pipeline subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SubsystemId {
    /// The orchestrating runtime.
    Runtime = 0,
    /// vx-01: vehicle feed.
    Simulation = 1,
    /// vx-02: projection and detections.
    Perception = 2,
    /// vx-03: multi-object tracking.
    Tracking = 3,
    /// vx-04: digital twin and communication graph.
    DigitalTwin = 4,
    /// vx-05: V2X message generation.
    Messaging = 5,
}

impl SubsystemId {
    /// Numeric id.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Short name used in logs and metric labels.
    pub fn name(self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::Simulation => "simulation",
            Self::Perception => "perception",
            Self::Tracking => "tracking",
            Self::DigitalTwin => "digital-twin",
            Self::Messaging => "messaging",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_class_roundtrip_ids() {
        for class in ObjectClass::ALL {
            assert_eq!(ObjectClass::from_id(class.id()), Some(class));
        }
        assert_eq!(ObjectClass::from_id(6), None);
        assert_eq!(ObjectClass::Motorcycle.name(), "motorcycle");
    }

    #[test]
    fn test_vehicle_state_optional_fields_default() {
        let json = r#"{"id":"veh_0","x":1.0,"y":2.0,"speed":3.0,"angle":90.0}"#;
        let state: VehicleState = serde_json::from_str(json).unwrap();
        assert_eq!(state.id, VehicleId::new("veh_0"));
        assert!(state.vehicle_class.is_none());
        assert_eq!(state.acceleration, 0.0);
    }

    #[test]
    fn test_vehicle_distance() {
        let a = VehicleState::new("a", 0.0, 0.0, 0.0, 0.0);
        let b = VehicleState::new("b", 3.0, 4.0, 0.0, 0.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_frame_lookup() {
        let frame = SimulationFrame::new(
            0,
            0.1,
            vec![VehicleState::new("a", 0.0, 0.0, 1.0, 0.0)],
        );
        assert!(frame.vehicle(&VehicleId::new("a")).is_some());
        assert!(frame.vehicle(&VehicleId::new("b")).is_none());
    }

    #[test]
    fn test_vehicle_id_serializes_as_string() {
        let id = VehicleId::new("veh_7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"veh_7\"");
    }
}
