//! # Shared Types Crate
//!
//! This crate contains all domain entities and V2X broadcast message types
//! exchanged between the pipeline subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Simulator Units**: World coordinates are SUMO meters, angles are SUMO
//!   headings in degrees, pixel coordinates are top-down image pixels.
//! - **Serde Everywhere**: Every type that leaves a subsystem is serializable,
//!   so it can be archived as JSON or replayed from a trace.

pub mod entities;
pub mod geometry;
pub mod messages;

pub use entities::*;
pub use geometry::*;
pub use messages::*;
