//! # Event Handlers
//!
//! Bus observers spawned next to the pipeline.

pub mod metrics;

pub use metrics::{MetricsHandler, PipelineStatus, StatusHandle};
