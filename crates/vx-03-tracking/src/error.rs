//! Error types for the tracking subsystem

use thiserror::Error;
use vx_02_perception::PerceptionError;

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Invalid tracker configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot project vehicles for matching: {0}")]
    Projection(#[from] PerceptionError),
}
