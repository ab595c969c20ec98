//! ByteTrack plus simulator ground truth.
//!
//! Every confirmed track is paired with at most one simulator vehicle per
//! frame. A pairing, once made, is kept for as long as that vehicle stays
//! in the simulation; otherwise the nearest unclaimed vehicle within
//! `match_radius_px` of the track center is taken.

use serde::Serialize;
use shared_types::{Detection, PixelPoint, TrackSnapshot, VehicleId, VehicleState, WorldPoint};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;
use vx_02_perception::WorldProjector;

use crate::domain::{ByteTracker, TrackerConfig};
use crate::error::TrackingError;
use crate::ports::TrackingApi;

/// Confidence attached to linear position predictions.
pub const PREDICTION_CONFIDENCE: f64 = 0.8;

/// One remembered state of a track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackHistoryEntry {
    pub frame: u64,
    /// Box center in pixels.
    pub center: [f64; 2],
    pub speed: f64,
    pub angle: f64,
    pub world_position: Option<WorldPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictedPosition {
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

pub struct EnhancedTracker {
    config: TrackerConfig,
    tracker: ByteTracker,
    history: HashMap<u64, VecDeque<TrackHistoryEntry>>,
    track_to_sumo: HashMap<u64, VehicleId>,
    frame_count: u64,
}

impl EnhancedTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, TrackingError> {
        config.validate()?;
        Ok(Self {
            tracker: ByteTracker::new(config.clone()),
            config,
            history: HashMap::new(),
            track_to_sumo: HashMap::new(),
            frame_count: 0,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Simulator vehicle currently paired with a track.
    pub fn sumo_id_of(&self, track_id: u64) -> Option<&VehicleId> {
        self.track_to_sumo.get(&track_id)
    }

    /// Track currently paired with a simulator vehicle.
    pub fn track_for_vehicle(&self, vehicle_id: &VehicleId) -> Option<u64> {
        self.track_to_sumo
            .iter()
            .find(|(_, v)| *v == vehicle_id)
            .map(|(track_id, _)| *track_id)
    }

    fn previous_speed(&self, track_id: u64) -> Option<f64> {
        self.history
            .get(&track_id)
            .and_then(|h| h.back())
            .filter(|entry| entry.world_position.is_some())
            .map(|entry| entry.speed)
    }

    fn attach_vehicle(&mut self, track: &mut TrackSnapshot, vehicle: &VehicleState) {
        track.sumo_id = Some(vehicle.id.clone());
        track.world_position = Some(vehicle.position());
        track.speed = vehicle.speed;
        track.angle = vehicle.angle;
        track.has_sumo_data = true;
        track.acceleration = match self.previous_speed(track.track_id) {
            Some(previous) => (vehicle.speed - previous) / self.config.step_length_s,
            None => 0.0,
        };
        let theta = vehicle.angle.to_radians();
        track.direction_vector = [theta.cos(), theta.sin()];
        self.track_to_sumo
            .insert(track.track_id, vehicle.id.clone());
    }

    fn match_vehicles(
        &mut self,
        tracks: &mut [TrackSnapshot],
        vehicles: &[VehicleState],
        projector: &WorldProjector,
    ) -> Result<(), TrackingError> {
        let projected: Vec<PixelPoint> = vehicles
            .iter()
            .map(|v| projector.world_to_pixel(v.x, v.y))
            .collect::<Result<_, _>>()?;
        let mut claimed: HashSet<usize> = HashSet::new();

        for track in tracks.iter_mut() {
            let remembered = self.track_to_sumo.get(&track.track_id).and_then(|id| {
                vehicles
                    .iter()
                    .position(|v| &v.id == id)
                    .filter(|i| !claimed.contains(i))
            });

            let chosen = remembered.or_else(|| {
                let [cx, cy] = track.center;
                projected
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !claimed.contains(i))
                    .map(|(i, p)| (i, p.distance_to(cx, cy)))
                    .filter(|(_, d)| *d < self.config.match_radius_px)
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(i, _)| i)
            });

            if let Some(i) = chosen {
                claimed.insert(i);
                self.attach_vehicle(track, &vehicles[i]);
            }
        }
        Ok(())
    }

    fn record_history(&mut self, tracks: &[TrackSnapshot]) {
        let limit = self.config.history_len;
        for track in tracks {
            let entries = self.history.entry(track.track_id).or_default();
            entries.push_back(TrackHistoryEntry {
                frame: self.frame_count,
                center: track.center,
                speed: track.speed,
                angle: track.angle,
                world_position: track.world_position,
            });
            while entries.len() > limit {
                entries.pop_front();
            }
        }

        let tracker = &self.tracker;
        self.history.retain(|id, _| tracker.is_alive(*id));
        self.track_to_sumo.retain(|id, _| tracker.is_alive(*id));
    }
}

impl TrackingApi for EnhancedTracker {
    fn update(
        &mut self,
        detections: &[Detection],
        vehicles: &[VehicleState],
        projector: &WorldProjector,
    ) -> Result<Vec<TrackSnapshot>, TrackingError> {
        self.frame_count += 1;
        let mut tracks = self.tracker.update(detections);
        for track in tracks.iter_mut() {
            track.frame = self.frame_count;
        }

        if self.config.use_sumo_matching && !vehicles.is_empty() {
            self.match_vehicles(&mut tracks, vehicles, projector)?;
        }
        self.record_history(&tracks);

        debug!(
            frame = self.frame_count,
            tracks = tracks.len(),
            matched = tracks.iter().filter(|t| t.has_sumo_data).count(),
            "Tracks updated"
        );
        Ok(tracks)
    }

    fn trajectory(&self, track_id: u64, num_points: usize) -> Vec<TrackHistoryEntry> {
        self.history
            .get(&track_id)
            .map(|h| {
                let skip = h.len().saturating_sub(num_points);
                h.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    fn predict_position(&self, track_id: u64, time_ahead_s: f64) -> Option<PredictedPosition> {
        let history = self.history.get(&track_id)?;
        if history.len() < 2 {
            return None;
        }
        let last = history.back()?;
        let position = last.world_position?;
        let theta = last.angle.to_radians();
        Some(PredictedPosition {
            x: position.x + last.speed * time_ahead_s * theta.cos(),
            y: position.y + last.speed * time_ahead_s * theta.sin(),
            confidence: PREDICTION_CONFIDENCE,
        })
    }

    fn v2x_relevant_tracks(&self, ego_track_id: Option<u64>, max_distance_m: f64) -> Vec<u64> {
        let mut all: Vec<u64> = self.history.keys().copied().collect();
        all.sort_unstable();

        let ego_position = ego_track_id
            .and_then(|id| self.history.get(&id))
            .and_then(|h| h.back())
            .and_then(|entry| entry.world_position);
        let (Some(ego_id), Some(ego)) = (ego_track_id, ego_position) else {
            return all;
        };

        all.into_iter()
            .filter(|&id| id != ego_id)
            .filter(|id| {
                self.history
                    .get(id)
                    .and_then(|h| h.back())
                    .and_then(|entry| entry.world_position)
                    .is_some_and(|p| p.distance_to(&ego) <= max_distance_m)
            })
            .collect()
    }
}
