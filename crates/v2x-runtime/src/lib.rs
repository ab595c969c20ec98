//! # V2X Runtime Library
//!
//! Exposes the runtime's modules for tests; the entry point is `main.rs`.
//!
//! - `container/`: configuration and subsystem construction
//! - `adapters/`: vehicle source and broadcast transport selection
//! - `handlers/`: bus observers (metrics)
//! - `pipeline/`: the per-frame loop

pub mod adapters;
pub mod cli;
pub mod container;
pub mod handlers;
pub mod pipeline;

pub use cli::Cli;
pub use container::{CliOverrides, ConfigError, NodeConfig, SubsystemContainer};
pub use handlers::{MetricsHandler, PipelineStatus, StatusHandle};
pub use pipeline::{EndReason, PipelineError, RunReport, V2xPipeline};
