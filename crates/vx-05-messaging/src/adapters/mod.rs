//! Adapters Layer

pub mod output;
pub mod transport;

pub use output::{OutputWriter, PipelineState};
pub use transport::{NoOpTransport, UdpBroadcastTransport, MAX_DATAGRAM_BYTES};
