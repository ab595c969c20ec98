//! # VX-03 Tracking
//!
//! ByteTrack multi-object tracking over pixel detections, with tracks
//! paired to the simulator vehicles they came from.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`)
//!   - `KalmanBoxFilter`: 8-D constant-velocity filter
//!   - `linear_assignment`: Hungarian matching with a cost limit
//!   - `ByteTracker`: high/low score association, track lifecycle
//!
//! - **Ports Layer** (`ports/`)
//!   - `TrackingApi`: driving port used by the runtime
//!
//! - **Service Layer** (`service/`)
//!   - `EnhancedTracker`: ByteTrack + vehicle matching, history, prediction
//!
//! ## Invariants
//!
//! - Track ids are unique per tracker and start at 1.
//! - A simulator vehicle is paired with at most one track per frame.
//!
//! ## Usage Example
//!
//! ```ignore
//! use vx_03_tracking::{EnhancedTracker, TrackerConfig, TrackingApi};
//!
//! let mut tracker = EnhancedTracker::new(TrackerConfig::for_step_length(0.1))?;
//! let tracks = tracker.update(&detections, &frame.vehicles, perception.projector())?;
//! ```

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{ByteTracker, KalmanBoxFilter, TrackerConfig};
pub use error::TrackingError;
pub use ports::TrackingApi;
pub use service::{EnhancedTracker, PredictedPosition, TrackHistoryEntry};
