//! Builds CAM and broadcast messages from tracks.

use shared_types::{
    MessageType, ObjectClass, TrackSnapshot, V2xMessage, V2xReportType, V2xVehicleReport,
    VehicleId,
};

/// Below this speed (m/s) a vehicle is reported stationary.
pub const STATIONARY_SPEED: f64 = 0.5;
/// Above this speed (m/s) a vehicle is reported high-speed.
pub const HIGH_SPEED: f64 = 15.0;

pub fn classify(class_id: u8, speed: f64) -> V2xReportType {
    if class_id == ObjectClass::Person.id() {
        V2xReportType::Vru
    } else if speed < STATIONARY_SPEED {
        V2xReportType::CamStationary
    } else if speed > HIGH_SPEED {
        V2xReportType::CamHighSpeed
    } else {
        V2xReportType::CamNormal
    }
}

/// Report for a single track.
pub fn to_report(track: &TrackSnapshot, timestep: f64, include_v2x_data: bool) -> V2xVehicleReport {
    let class = ObjectClass::from_id(track.class_id)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let mut report = V2xVehicleReport {
        id: track.track_id,
        sumo_id: track.sumo_id.clone(),
        bbox: track.bbox.to_pixels(),
        class,
        class_id: track.class_id,
        confidence: track.score,
        timestamp: timestep,
        position: None,
        speed: None,
        heading: None,
        v2x_type: None,
    };
    if include_v2x_data {
        report.position = track.world_position;
        report.speed = Some(track.speed);
        report.heading = Some(track.angle);
        report.v2x_type = Some(classify(track.class_id, track.speed));
    }
    report
}

/// Plain CAM message with one report per track.
pub fn to_message(tracks: &[TrackSnapshot], timestep: f64, include_v2x_data: bool) -> V2xMessage {
    let vehicles = tracks
        .iter()
        .map(|t| to_report(t, timestep, include_v2x_data))
        .collect();
    V2xMessage::new(MessageType::Cam, timestep, vehicles)
}

/// Broadcast from the ego vehicle's perspective.
///
/// With an ego id, `nearby_vehicles` holds every report that is not the ego
/// itself and, when the ego has a known world position, lies within
/// `range_m` of it.
pub fn create_broadcast(
    tracks: &[TrackSnapshot],
    timestep: f64,
    ego_vehicle_id: Option<&VehicleId>,
    range_m: f64,
) -> V2xMessage {
    let mut message = to_message(tracks, timestep, true);
    message.message_type = MessageType::V2xBroadcast;
    message.ego_vehicle = ego_vehicle_id.cloned();
    message.range_km = Some(range_m / 1000.0);

    if let Some(ego) = ego_vehicle_id {
        let ego_position = message
            .vehicles
            .iter()
            .find(|r| r.sumo_id.as_ref() == Some(ego))
            .and_then(|r| r.position);
        let nearby = message
            .vehicles
            .iter()
            .filter(|r| r.sumo_id.as_ref() != Some(ego))
            .filter(|r| match (ego_position, r.position) {
                (Some(origin), Some(p)) => origin.distance_to(&p) <= range_m,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .cloned()
            .collect();
        message.nearby_vehicles = Some(nearby);
    }
    message
}
