//! # VX-04 Digital Twin
//!
//! Mirrors every simulated vehicle and the V2V links between vehicles
//! within radio range.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`)
//!   - `TwinConfig`: radio range, stale-vehicle policy
//!   - `build_links`: grid-bucketed pair search
//!   - `TwinSnapshot` / `TwinStats`
//!
//! - **Ports Layer** (`ports/`)
//!   - `DigitalTwinApi`
//!
//! - **Service Layer** (`service/`)
//!   - `DigitalTwin`: implements `DigitalTwinApi`
//!
//! - **Adapters Layer** (`adapters/`)
//!   - `render_svg`: top-down view
//!
//! ## Invariants
//!
//! - A link `(a, b)` exists iff both vehicles are in the twin and their
//!   distance is at most `comm_radius_m`; it is reported once, with `a < b`.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::render_svg;
pub use domain::{CommLink, TwinConfig, TwinSnapshot, TwinStats, VehicleNode};
pub use error::TwinError;
pub use ports::DigitalTwinApi;
pub use service::DigitalTwin;
