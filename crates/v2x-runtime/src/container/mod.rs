//! # Subsystem Container
//!
//! Configuration and construction of the pipeline's subsystems.

pub mod config;
pub mod subsystems;

pub use config::{CliOverrides, ConfigError, NodeConfig, OutputConfig, SimulationSettings};
pub use subsystems::SubsystemContainer;
