//! # Adapters
//!
//! Selection of the I/O adapters a run talks to.

pub mod sources;

pub use sources::{build_source, build_transport};
