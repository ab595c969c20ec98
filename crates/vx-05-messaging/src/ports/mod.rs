//! Outbound Ports (Driven Ports)

use async_trait::async_trait;
use shared_types::V2xMessage;

use crate::error::MessagingError;

/// Delivers broadcast messages to other V2X participants.
#[async_trait]
pub trait BroadcastTransport: Send + Sync {
    /// Send one message; returns the number of payload bytes sent.
    async fn send(&self, message: &V2xMessage) -> Result<usize, MessagingError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}
