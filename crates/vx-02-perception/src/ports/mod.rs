//! Inbound Ports (Driving Ports)

use shared_types::{Detection, SimulationFrame};
use std::collections::BTreeMap;

use crate::domain::WorldProjector;
use crate::error::PerceptionError;

/// Turns simulator frames into detections.
pub trait DetectionApi: Send {
    /// Detections for every vehicle in `frame`, in vehicle order.
    ///
    /// An empty frame yields no detections and leaves uncomputed bounds
    /// untouched.
    fn detect(&mut self, frame: &SimulationFrame) -> Result<Vec<Detection>, PerceptionError>;

    /// Class id → class name.
    fn class_names(&self) -> BTreeMap<u8, &'static str>;

    /// Projection shared with tracking and rendering.
    fn projector(&self) -> &WorldProjector;
}
