//! Broadcast transports.

use async_trait::async_trait;
use shared_types::V2xMessage;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, info};

use crate::error::MessagingError;
use crate::ports::BroadcastTransport;

/// Largest JSON payload sent in one datagram.
pub const MAX_DATAGRAM_BYTES: usize = 64 * 1024;

/// Sends each message as one JSON datagram.
pub struct UdpBroadcastTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpBroadcastTransport {
    /// Bind an ephemeral local socket aimed at `target` (`host:port`).
    pub async fn connect(target: &str) -> Result<Self, MessagingError> {
        let target = lookup_host(target)
            .await
            .map_err(|e| MessagingError::InvalidTarget(format!("{target}: {e}")))?
            .next()
            .ok_or_else(|| MessagingError::InvalidTarget(target.to_string()))?;
        let local: SocketAddr = if target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(local).await?;
        socket.set_broadcast(true)?;
        info!(%target, local = %socket.local_addr()?, "UDP broadcast transport ready");
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

#[async_trait]
impl BroadcastTransport for UdpBroadcastTransport {
    async fn send(&self, message: &V2xMessage) -> Result<usize, MessagingError> {
        let payload = serde_json::to_vec(message)?;
        if payload.len() > MAX_DATAGRAM_BYTES {
            return Err(MessagingError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_DATAGRAM_BYTES,
            });
        }
        let sent = self.socket.send_to(&payload, self.target).await?;
        debug!(message_id = %message.message_id, bytes = sent, "Broadcast sent");
        Ok(sent)
    }

    fn describe(&self) -> String {
        format!("udp {}", self.target)
    }
}

/// Drops every message; counts them for diagnostics.
#[derive(Debug, Default)]
pub struct NoOpTransport {
    sent: AtomicU64,
}

impl NoOpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl BroadcastTransport for NoOpTransport {
    async fn send(&self, _message: &V2xMessage) -> Result<usize, MessagingError> {
        self.sent.fetch_add(1, Ordering::Relaxed);
        Ok(0)
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::to_message;
    use shared_types::{BoundingBox, TrackSnapshot};

    #[tokio::test]
    async fn test_udp_round_trip() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap().to_string();
        let transport = UdpBroadcastTransport::connect(&addr).await.unwrap();

        let tracks = vec![TrackSnapshot::new(
            1,
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            1.0,
            1,
            1,
        )];
        let message = to_message(&tracks, 0.1, true);
        let sent = transport.send(&message).await.unwrap();

        let mut buf = vec![0u8; MAX_DATAGRAM_BYTES];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(len, sent);
        let received: V2xMessage = serde_json::from_slice(&buf[..len]).unwrap();
        assert_eq!(received.message_id, message.message_id);
        assert_eq!(received.vehicles.len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_payload_rejected() {
        let transport = UdpBroadcastTransport::connect("127.0.0.1:9").await.unwrap();
        let tracks: Vec<TrackSnapshot> = (0..2000)
            .map(|id| TrackSnapshot::new(id, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 1.0, 1, 1))
            .collect();
        let err = transport
            .send(&to_message(&tracks, 0.0, true))
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_invalid_target() {
        assert!(matches!(
            UdpBroadcastTransport::connect("not an address").await,
            Err(MessagingError::InvalidTarget(_))
        ));
    }

    #[tokio::test]
    async fn test_noop_counts() {
        let transport = NoOpTransport::new();
        transport.send(&to_message(&[], 0.0, false)).await.unwrap();
        transport.send(&to_message(&[], 0.1, false)).await.unwrap();
        assert_eq!(transport.sent(), 2);
    }
}
