//! Domain Layer
//!
//! Kalman filtering, assignment and the ByteTrack state machine.

pub mod assignment;
pub mod byte_tracker;
pub mod config;
pub mod kalman;
pub mod track;

pub use assignment::{fuse_score, iou_distance, linear_assignment, Assignment};
pub use byte_tracker::ByteTracker;
pub use config::TrackerConfig;
pub use kalman::KalmanBoxFilter;
pub use track::{Track, TrackState};
