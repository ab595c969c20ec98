//! Tracker configuration

use serde::{Deserialize, Serialize};

use crate::error::TrackingError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frames per second of the detection stream.
    pub frame_rate: f64,
    /// Detections at or above this score start and confirm tracks.
    pub track_thresh: f64,
    /// Frames a lost track is kept at 30 fps; scaled by `frame_rate`.
    pub track_buffer: u32,
    /// Cost limit of the first association pass.
    pub match_thresh: f64,
    /// Detections at or below this score are discarded.
    pub low_score_thresh: f64,
    /// Attach simulator vehicles to tracks.
    pub use_sumo_matching: bool,
    /// Maximum pixel distance between a track center and a vehicle.
    pub match_radius_px: f64,
    /// States remembered per track.
    pub history_len: usize,
    /// Seconds between frames, used for acceleration.
    pub step_length_s: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            frame_rate: 10.0,
            track_thresh: 0.6,
            track_buffer: 30,
            match_thresh: 0.8,
            low_score_thresh: 0.1,
            use_sumo_matching: true,
            match_radius_px: 50.0,
            history_len: 30,
            step_length_s: 0.1,
        }
    }
}

impl TrackerConfig {
    /// Defaults for a simulator stepping every `seconds`.
    pub fn for_step_length(seconds: f64) -> Self {
        Self::default().with_step_length(seconds)
    }

    /// Sets both the step length and the matching frame rate.
    pub fn with_step_length(mut self, seconds: f64) -> Self {
        self.step_length_s = seconds;
        self.frame_rate = 1.0 / seconds;
        self
    }

    pub fn with_sumo_matching(mut self, enabled: bool) -> Self {
        self.use_sumo_matching = enabled;
        self
    }

    /// Frames after which a lost track is dropped.
    pub fn max_time_lost(&self) -> u64 {
        (self.frame_rate / 30.0 * f64::from(self.track_buffer)) as u64
    }

    /// Minimum score for a detection to open a new track.
    pub fn new_track_thresh(&self) -> f64 {
        self.track_thresh + 0.1
    }

    pub fn validate(&self) -> Result<(), TrackingError> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(TrackingError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        };
        positive("frame_rate", self.frame_rate)?;
        positive("step_length_s", self.step_length_s)?;
        positive("match_radius_px", self.match_radius_px)?;

        for (name, value) in [
            ("track_thresh", self.track_thresh),
            ("match_thresh", self.match_thresh),
            ("low_score_thresh", self.low_score_thresh),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrackingError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.low_score_thresh >= self.track_thresh {
            return Err(TrackingError::InvalidConfig(
                "low_score_thresh must be below track_thresh".to_string(),
            ));
        }
        if self.history_len == 0 {
            return Err(TrackingError::InvalidConfig(
                "history_len cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_time_lost(), 10);
        assert!((config.new_track_thresh() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_step_length_drives_frame_rate() {
        let config = TrackerConfig::for_step_length(0.05);
        assert_eq!(config.frame_rate, 20.0);
        assert_eq!(config.max_time_lost(), 20);
    }

    #[test]
    fn test_validation() {
        let bad = TrackerConfig {
            low_score_thresh: 0.7,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = TrackerConfig {
            history_len: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        assert!(TrackerConfig::for_step_length(0.0).validate().is_err());
    }
}
