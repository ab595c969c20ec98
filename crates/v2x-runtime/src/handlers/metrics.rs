//! # Metrics Handler
//!
//! Turns bus events into Prometheus metrics and a shared status record.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use shared_bus::{EventFilter, Subscription, V2xEvent};
use v2x_telemetry::{
    DETECTIONS_PRODUCED, FRAMES_PROCESSED, LINKS_ACTIVE, MESSAGES_BROADCAST, SUBSYSTEM_ERRORS,
    TRACKS_ACTIVE, VEHICLES_ACTIVE,
};

/// Latest figures seen on the bus.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStatus {
    pub frames: u64,
    pub last_step: u64,
    pub vehicles: usize,
    pub detections: u64,
    pub tracks: usize,
    pub links: usize,
    /// Messages by type wire name.
    pub messages: BTreeMap<String, u64>,
    pub errors: u64,
    /// Set once `SimulationEnded` is seen.
    pub end_reason: Option<String>,
}

pub type StatusHandle = Arc<RwLock<PipelineStatus>>;

pub struct MetricsHandler {
    subscription: Subscription,
    status: StatusHandle,
}

impl MetricsHandler {
    pub fn new(bus: &shared_bus::InMemoryEventBus) -> Self {
        Self {
            subscription: bus.subscribe(EventFilter::all()),
            status: Arc::new(RwLock::new(PipelineStatus::default())),
        }
    }

    pub fn status(&self) -> StatusHandle {
        Arc::clone(&self.status)
    }

    /// Consume events until the run ends or the bus is dropped.
    pub async fn run(mut self) {
        debug!("Metrics handler started");
        while let Some(event) = self.subscription.recv().await {
            let finished = matches!(event, V2xEvent::SimulationEnded { .. });
            Self::record(&self.status, &event);
            if finished {
                break;
            }
        }
        info!("Metrics handler stopped");
    }

    fn record(status: &StatusHandle, event: &V2xEvent) {
        let mut status = status.write();
        match event {
            V2xEvent::FrameCaptured {
                step,
                vehicle_count,
                ..
            } => {
                FRAMES_PROCESSED.inc();
                VEHICLES_ACTIVE.set(*vehicle_count as f64);
                status.frames += 1;
                status.last_step = *step;
                status.vehicles = *vehicle_count;
            }
            V2xEvent::DetectionsProduced { count, .. } => {
                DETECTIONS_PRODUCED.inc_by(*count as f64);
                status.detections += *count as u64;
            }
            V2xEvent::TracksUpdated { tracks, .. } => {
                TRACKS_ACTIVE.set(tracks.len() as f64);
                status.tracks = tracks.len();
            }
            V2xEvent::TwinUpdated { links, .. } => {
                LINKS_ACTIVE.set(*links as f64);
                status.links = *links;
            }
            V2xEvent::MessageBroadcast(message) => {
                let kind = message.message_type.as_str();
                MESSAGES_BROADCAST.with_label_values(&[kind]).inc();
                *status.messages.entry(kind.to_string()).or_insert(0) += 1;
            }
            V2xEvent::CriticalError {
                subsystem_id,
                error,
            } => {
                SUBSYSTEM_ERRORS
                    .with_label_values(&[subsystem_id.name(), "critical"])
                    .inc();
                status.errors += 1;
                debug!(subsystem = subsystem_id.name(), %error, "Critical error recorded");
            }
            V2xEvent::SimulationEnded { reason, .. } => {
                status.end_reason = Some(reason.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::{EventPublisher, InMemoryEventBus};
    use shared_types::{BoundingBox, MessageType, SubsystemId, TrackSnapshot, V2xMessage};

    #[tokio::test]
    async fn test_status_follows_events() {
        let bus = InMemoryEventBus::new();
        let handler = MetricsHandler::new(&bus);
        let status = handler.status();
        let task = tokio::spawn(handler.run());

        bus.publish(V2xEvent::FrameCaptured {
            step: 3,
            time_s: 0.3,
            vehicle_count: 2,
        })
        .await;
        bus.publish(V2xEvent::DetectionsProduced { step: 3, count: 2 }).await;
        bus.publish(V2xEvent::TracksUpdated {
            frame: 1,
            tracks: vec![TrackSnapshot::new(
                1,
                BoundingBox::new(0.0, 0.0, 1.0, 1.0),
                1.0,
                1,
                1,
            )],
        })
        .await;
        bus.publish(V2xEvent::TwinUpdated {
            step: 3,
            vehicles: 2,
            links: 1,
        })
        .await;
        bus.publish(V2xEvent::MessageBroadcast(V2xMessage::new(
            MessageType::V2xBroadcast,
            0.3,
            Vec::new(),
        )))
        .await;
        bus.publish(V2xEvent::CriticalError {
            subsystem_id: SubsystemId::Messaging,
            error: "send failed".into(),
        })
        .await;
        bus.publish(V2xEvent::SimulationEnded {
            step: 3,
            reason: "test".into(),
        })
        .await;
        task.await.unwrap();

        let status = status.read();
        assert_eq!(status.frames, 1);
        assert_eq!(status.last_step, 3);
        assert_eq!(status.detections, 2);
        assert_eq!(status.tracks, 1);
        assert_eq!(status.links, 1);
        assert_eq!(status.messages["V2X_BROADCAST"], 1);
        assert_eq!(status.errors, 1);
        assert_eq!(status.end_reason.as_deref(), Some("test"));
    }
}
