//! # VX-02 Perception
//!
//! Projects simulator vehicles onto a top-down image and emits one
//! ground-truth detection per vehicle.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`)
//!   - `PerceptionConfig`: image size, bounds, class table
//!   - `WorldProjector`: meters → pixels, bounds frozen after first fit
//!   - `classes`: class inference and per-class box sizes
//!
//! - **Ports Layer** (`ports/`)
//!   - `DetectionApi`: driving port used by the runtime
//!
//! - **Service Layer** (`service/`)
//!   - `DetectionService`: implements `DetectionApi`
//!
//! ## Usage Example
//!
//! ```ignore
//! use vx_02_perception::{DetectionApi, DetectionService, PerceptionConfig};
//!
//! let mut perception = DetectionService::new(PerceptionConfig::default())?;
//! let detections = perception.detect(&frame)?;
//! let pixel = perception.projector().world_to_pixel(12.0, 40.0)?;
//! ```

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{DetectionMode, PerceptionConfig, WorldProjector};
pub use error::PerceptionError;
pub use ports::DetectionApi;
pub use service::detection_service::GROUND_TRUTH_CONFIDENCE;
pub use service::DetectionService;
