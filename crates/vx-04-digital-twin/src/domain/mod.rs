//! Domain Layer

pub mod config;
pub mod graph;

pub use config::TwinConfig;
pub use graph::{build_links, CommLink, TwinSnapshot, TwinStats, VehicleNode};
