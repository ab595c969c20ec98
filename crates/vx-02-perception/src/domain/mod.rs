//! Domain Layer
//!
//! Pure projection and class logic, no I/O.

pub mod classes;
pub mod config;
pub mod projector;

pub use classes::{base_half_size, class_for_sumo_class, half_size, infer_class_from_id};
pub use config::{default_vehicle_types, DetectionMode, PerceptionConfig};
pub use projector::WorldProjector;
