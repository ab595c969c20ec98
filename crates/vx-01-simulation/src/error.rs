//! Error types for the simulation subsystem

use thiserror::Error;

/// Errors raised by vehicle sources and the TraCI client.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not connect to TraCI server at {addr} after {attempts} attempts")]
    Connect { addr: String, attempts: u32 },

    #[error("TraCI protocol error: {0}")]
    Protocol(String),

    #[error("TraCI command 0x{command:02x} failed: {description}")]
    CommandFailed { command: u8, description: String },

    #[error("Failed to launch simulator: {0}")]
    Launch(String),

    #[error("Trace line {line}: {reason}")]
    Trace { line: usize, reason: String },

    #[error("Vehicle source not started")]
    NotStarted,

    #[error("Invalid simulation configuration: {0}")]
    InvalidConfig(String),
}

impl SimulationError {
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}
