//! Error types for the perception subsystem

use thiserror::Error;

/// Errors that can occur while projecting vehicles into the image frame.
#[derive(Debug, Error, PartialEq)]
pub enum PerceptionError {
    #[error("Cannot compute world bounds without vehicles")]
    NoVehicles,

    #[error("World bounds are not known yet")]
    BoundsUnknown,

    #[error("Degenerate world bounds: ({xmin}, {ymin}) .. ({xmax}, {ymax})")]
    InvalidBounds {
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },

    #[error("Invalid perception configuration: {0}")]
    InvalidConfig(String),
}
