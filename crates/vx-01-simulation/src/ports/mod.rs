//! Ports for the simulation subsystem.

use async_trait::async_trait;
use shared_types::SimulationFrame;

use crate::error::SimulationError;

/// A feed of simulation frames (Driven Port for the pipeline).
///
/// `start` must be called once before `next_frame`. `next_frame` returns
/// `Ok(None)` when the simulation has ended; `close` releases resources
/// and may be called more than once.
#[async_trait]
pub trait VehicleSource: Send {
    async fn start(&mut self) -> Result<(), SimulationError>;

    async fn next_frame(&mut self) -> Result<Option<SimulationFrame>, SimulationError>;

    async fn close(&mut self) -> Result<(), SimulationError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}
