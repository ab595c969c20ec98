//! # VX-05 Messaging
//!
//! Turns tracks into V2X messages, keeps the run's message archive and
//! delivers broadcasts.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`)
//!   - `to_message` / `create_broadcast`: CAM and ego-perspective broadcasts
//!   - `classify`: per-vehicle report type
//!   - `MessageArchive`: append-only record with summary statistics
//!
//! - **Ports Layer** (`ports/`)
//!   - `BroadcastTransport`
//!
//! - **Adapters Layer** (`adapters/`)
//!   - `UdpBroadcastTransport`, `NoOpTransport`
//!   - `OutputWriter`: archive, track and state files
//!
//! ## Invariants
//!
//! - `total_vehicles == vehicles.len()` for every message.
//! - A broadcast never lists the ego vehicle among `nearby_vehicles`.
//!
//! ## Usage Example
//!
//! ```ignore
//! let config = MessagingConfig::default();
//! let msg = create_broadcast(&tracks, 0.5, config.ego_vehicle_id.as_ref(), config.v2x_range_m);
//! archive.push(msg);
//! OutputWriter::new("./v2x_results").save_archive(&archive).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;

pub use adapters::{
    NoOpTransport, OutputWriter, PipelineState, UdpBroadcastTransport, MAX_DATAGRAM_BYTES,
};
pub use domain::{
    classify, create_broadcast, to_message, to_report, ArchiveSummary, MessageArchive,
    MessagingConfig,
};
pub use error::MessagingError;
pub use ports::BroadcastTransport;
