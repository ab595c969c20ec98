//! Inbound Ports (Driving Ports)

use shared_types::{SimulationFrame, VehicleId};

use crate::domain::{TwinSnapshot, TwinStats, VehicleNode};
use crate::error::TwinError;

/// Live replica of the simulated vehicles.
pub trait DigitalTwinApi: Send {
    /// Upsert every vehicle in `frame`, expire absent ones, rebuild links.
    fn apply_frame(&mut self, frame: &SimulationFrame) -> TwinSnapshot;

    /// Vehicles linked to `id`, ordered by id.
    fn neighbors(&self, id: &VehicleId) -> Result<Vec<VehicleId>, TwinError>;

    fn node(&self, id: &VehicleId) -> Option<&VehicleNode>;

    fn snapshot(&self) -> TwinSnapshot;

    fn stats(&self) -> TwinStats;
}
