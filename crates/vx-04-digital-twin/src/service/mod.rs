//! Service Layer

pub mod digital_twin;

pub use digital_twin::DigitalTwin;
