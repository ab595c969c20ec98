//! # VX-01 Simulation
//!
//! Vehicle feed for the V2X pipeline.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): no I/O
//!   - `SumoConfig`: how to launch or reach the simulator
//!   - `protocol`: TraCI framing, status handling and typed values
//!
//! - **Ports Layer** (`ports/`)
//!   - `VehicleSource`: `start` / `next_frame` / `close`
//!
//! - **Adapters Layer** (`adapters/`)
//!   - `TraciClient`: async TraCI session over TCP
//!   - `SumoRunner`: spawns SUMO and steps it once per frame
//!   - `TraceReplaySource` / `TraceRecorder`: JSON-lines traces
//!   - `InMemoryVehicleSource`: scripted frames
//!
//! ## Invariants
//!
//! - Frame steps start at 0 and increase by one per yielded frame.
//! - `SumoRunner` yields the frame during which the simulator reports no
//!   more expected vehicles, and ends on the following call.
//!
//! ## Usage Example
//!
//! ```ignore
//! use vx_01_simulation::{SumoConfig, SumoRunner, VehicleSource};
//!
//! let mut source = SumoRunner::new(SumoConfig::default().with_sumocfg("city.sumocfg"));
//! source.start().await?;
//! while let Some(frame) = source.next_frame().await? {
//!     println!("step {} has {} vehicles", frame.step, frame.vehicles.len());
//! }
//! source.close().await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use adapters::{
    InMemoryVehicleSource, SumoRunner, TraceRecorder, TraceReplaySource, TraciClient,
};
pub use domain::{SumoConfig, DEFAULT_TRACI_PORT};
pub use error::SimulationError;
pub use ports::VehicleSource;
