//! Domain layer: simulator settings and the TraCI wire format.

pub mod config;
pub mod protocol;

pub use config::{SumoConfig, DEFAULT_TRACI_PORT};
pub use protocol::{Command, Status, TraciValue, VariableResponse};
