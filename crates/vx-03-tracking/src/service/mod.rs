//! Service Layer

pub mod enhanced_tracker;

pub use enhanced_tracker::{EnhancedTracker, PredictedPosition, TrackHistoryEntry};
