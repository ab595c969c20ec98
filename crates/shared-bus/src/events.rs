//! # Pipeline Events
//!
//! Defines all event types that flow through the shared bus.

use serde::{Deserialize, Serialize};
use shared_types::{SubsystemId, TrackSnapshot, V2xMessage};

/// All events that can be published to the event bus.
///
/// Each stage of a pipeline frame emits exactly one event describing
/// its output, in stage order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum V2xEvent {
    // =========================================================================
    // VX-01: SIMULATION
    // =========================================================================
    /// A simulation step was pulled from the vehicle source.
    FrameCaptured {
        step: u64,
        time_s: f64,
        vehicle_count: usize,
    },

    /// The vehicle source is exhausted or the run was stopped.
    SimulationEnded {
        /// Last step processed.
        step: u64,
        /// Human-readable stop reason.
        reason: String,
    },

    // =========================================================================
    // VX-02: PERCEPTION
    // =========================================================================
    /// Detections were produced for a step.
    DetectionsProduced { step: u64, count: usize },

    // =========================================================================
    // VX-03: TRACKING
    // =========================================================================
    /// Tracker output for one frame (confirmed tracks only).
    TracksUpdated {
        frame: u64,
        tracks: Vec<TrackSnapshot>,
    },

    // =========================================================================
    // VX-04: DIGITAL TWIN
    // =========================================================================
    /// The twin absorbed a frame.
    TwinUpdated {
        step: u64,
        /// Vehicles currently in the twin.
        vehicles: usize,
        /// Links in the communication graph.
        links: usize,
    },

    // =========================================================================
    // VX-05: MESSAGING
    // =========================================================================
    /// A V2X message was generated (and transmitted, if a transport is set).
    MessageBroadcast(V2xMessage),

    // =========================================================================
    // CRITICAL EVENTS (DLQ)
    // =========================================================================
    /// Error that aborted a stage.
    CriticalError {
        /// The subsystem that encountered the error.
        subsystem_id: SubsystemId,
        /// Error description.
        error: String,
    },
}

impl V2xEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::FrameCaptured { .. } | Self::SimulationEnded { .. } => EventTopic::Simulation,
            Self::DetectionsProduced { .. } => EventTopic::Perception,
            Self::TracksUpdated { .. } => EventTopic::Tracking,
            Self::TwinUpdated { .. } => EventTopic::DigitalTwin,
            Self::MessageBroadcast(_) => EventTopic::Messaging,
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
        }
    }

    /// Get the originating subsystem.
    #[must_use]
    pub fn source_subsystem(&self) -> SubsystemId {
        match self {
            Self::FrameCaptured { .. } => SubsystemId::Simulation,
            Self::SimulationEnded { .. } => SubsystemId::Runtime,
            Self::DetectionsProduced { .. } => SubsystemId::Perception,
            Self::TracksUpdated { .. } => SubsystemId::Tracking,
            Self::TwinUpdated { .. } => SubsystemId::DigitalTwin,
            Self::MessageBroadcast(_) => SubsystemId::Messaging,
            Self::CriticalError { subsystem_id, .. } => *subsystem_id,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// vx-01 events and end-of-run.
    Simulation,
    /// vx-02 events.
    Perception,
    /// vx-03 events.
    Tracking,
    /// vx-04 events.
    DigitalTwin,
    /// vx-05 events.
    Messaging,
    /// Critical errors.
    DeadLetterQueue,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source subsystems to include. Empty means all sources.
    pub source_subsystems: Vec<SubsystemId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            source_subsystems: Vec::new(),
        }
    }

    /// Create a filter for events from specific subsystems.
    #[must_use]
    pub fn from_subsystems(subsystems: Vec<SubsystemId>) -> Self {
        Self {
            topics: Vec::new(),
            source_subsystems: subsystems,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &V2xEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.source_subsystems.is_empty()
            || self.source_subsystems.contains(&event.source_subsystem());

        topic_match && source_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_event() -> V2xEvent {
        V2xEvent::FrameCaptured {
            step: 3,
            time_s: 0.3,
            vehicle_count: 12,
        }
    }

    #[test]
    fn test_event_topic_mapping() {
        let event = V2xEvent::TwinUpdated {
            step: 1,
            vehicles: 4,
            links: 2,
        };
        assert_eq!(event.topic(), EventTopic::DigitalTwin);
        assert_eq!(event.source_subsystem(), SubsystemId::DigitalTwin);
        assert_eq!(frame_event().topic(), EventTopic::Simulation);
    }

    #[test]
    fn test_filter_all() {
        assert!(EventFilter::all().matches(&frame_event()));
        assert!(EventFilter::topics(vec![EventTopic::All]).matches(&frame_event()));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Tracking]);
        let tracks = V2xEvent::TracksUpdated {
            frame: 1,
            tracks: Vec::new(),
        };
        assert!(filter.matches(&tracks));
        assert!(!filter.matches(&frame_event()));
    }

    #[test]
    fn test_critical_error_source_is_reporter() {
        let event = V2xEvent::CriticalError {
            subsystem_id: SubsystemId::Perception,
            error: "bounds".into(),
        };
        assert_eq!(event.topic(), EventTopic::DeadLetterQueue);

        let filter = EventFilter::from_subsystems(vec![SubsystemId::Perception]);
        assert!(filter.matches(&event));
        assert!(!filter.matches(&frame_event()));
    }
}
