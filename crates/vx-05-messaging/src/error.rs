//! Error types for the messaging subsystem

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Payload too large: {size} > {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Invalid broadcast target: {0}")]
    InvalidTarget(String),

    #[error("Invalid messaging configuration: {0}")]
    InvalidConfig(String),
}
