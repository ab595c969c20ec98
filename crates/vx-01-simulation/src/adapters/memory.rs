//! Scripted in-memory vehicle source.

use async_trait::async_trait;
use shared_types::SimulationFrame;
use std::collections::VecDeque;

use crate::error::SimulationError;
use crate::ports::VehicleSource;

/// Yields a fixed list of frames, then ends.
#[derive(Debug, Default)]
pub struct InMemoryVehicleSource {
    frames: VecDeque<SimulationFrame>,
    started: bool,
    closed: bool,
}

impl InMemoryVehicleSource {
    pub fn new(frames: impl IntoIterator<Item = SimulationFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            started: false,
            closed: false,
        }
    }

    /// Frames not yet consumed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl VehicleSource for InMemoryVehicleSource {
    async fn start(&mut self) -> Result<(), SimulationError> {
        self.started = true;
        Ok(())
    }

    async fn next_frame(&mut self) -> Result<Option<SimulationFrame>, SimulationError> {
        if !self.started {
            return Err(SimulationError::NotStarted);
        }
        Ok(self.frames.pop_front())
    }

    async fn close(&mut self) -> Result<(), SimulationError> {
        self.closed = true;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} frames)", self.frames.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_in_order_then_none() {
        let mut source = InMemoryVehicleSource::new(vec![
            SimulationFrame::new(0, 0.1, vec![]),
            SimulationFrame::new(1, 0.2, vec![]),
        ]);
        assert!(matches!(
            source.next_frame().await,
            Err(SimulationError::NotStarted)
        ));

        source.start().await.unwrap();
        assert_eq!(source.next_frame().await.unwrap().unwrap().step, 0);
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.next_frame().await.unwrap().unwrap().step, 1);
        assert!(source.next_frame().await.unwrap().is_none());

        source.close().await.unwrap();
        assert!(source.is_closed());
    }
}
