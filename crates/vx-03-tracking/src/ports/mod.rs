//! Inbound Ports (Driving Ports)

use shared_types::{Detection, TrackSnapshot, VehicleState};
use vx_02_perception::WorldProjector;

use crate::error::TrackingError;
use crate::service::enhanced_tracker::{PredictedPosition, TrackHistoryEntry};

/// Multi-object tracking over detections, enriched with simulator vehicles.
pub trait TrackingApi: Send {
    /// Advance one frame; returns confirmed tracks ordered by id.
    fn update(
        &mut self,
        detections: &[Detection],
        vehicles: &[VehicleState],
        projector: &WorldProjector,
    ) -> Result<Vec<TrackSnapshot>, TrackingError>;

    /// Up to `num_points` most recent states of a track, oldest first.
    fn trajectory(&self, track_id: u64, num_points: usize) -> Vec<TrackHistoryEntry>;

    /// Linear extrapolation of the last known world position.
    fn predict_position(&self, track_id: u64, time_ahead_s: f64) -> Option<PredictedPosition>;

    /// Tracks within `max_distance_m` of the ego track, or every track
    /// when the ego or its position is unknown.
    fn v2x_relevant_tracks(&self, ego_track_id: Option<u64>, max_distance_m: f64) -> Vec<u64>;
}
