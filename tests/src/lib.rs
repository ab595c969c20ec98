//! # V2X Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Scripted traffic shared by tests and benches
//! └── integration/      # Whole-pipeline flows
//!     ├── flows.rs      # In-memory and trace-replay runs
//!     └── e2e_traci.rs  # Runs against a scripted TraCI server
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p v2x-tests
//! cargo bench -p v2x-tests
//! ```

pub mod fixtures;
pub mod integration;
