//! Error types for the digital twin subsystem

use shared_types::VehicleId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TwinError {
    #[error("Invalid twin configuration: {0}")]
    InvalidConfig(String),

    #[error("Vehicle not in twin: {0}")]
    UnknownVehicle(VehicleId),
}
