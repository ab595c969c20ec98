//! Adapters: concrete vehicle sources and the TraCI client.

pub mod memory;
pub mod sumo_runner;
pub mod trace;
pub mod traci_client;

pub use memory::InMemoryVehicleSource;
pub use sumo_runner::SumoRunner;
pub use trace::{TraceRecorder, TraceReplaySource};
pub use traci_client::TraciClient;
