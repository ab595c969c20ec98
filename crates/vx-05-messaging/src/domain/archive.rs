//! In-memory record of every message emitted during a run.

use serde::{Deserialize, Serialize};
use shared_types::V2xMessage;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSummary {
    pub total_messages: usize,
    /// Count per message type wire name.
    pub message_types: BTreeMap<String, usize>,
    pub avg_vehicles_per_message: f64,
    /// Distinct track ids across all messages.
    pub total_unique_vehicles: usize,
}

#[derive(Debug, Default, Clone)]
pub struct MessageArchive {
    messages: Vec<V2xMessage>,
}

impl MessageArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: V2xMessage) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[V2xMessage] {
        &self.messages
    }

    /// The most recent `n` messages, oldest first.
    pub fn last_n(&self, n: usize) -> &[V2xMessage] {
        &self.messages[self.messages.len().saturating_sub(n)..]
    }

    pub fn summary(&self) -> ArchiveSummary {
        let mut message_types = BTreeMap::new();
        let mut unique = BTreeSet::new();
        let mut vehicles = 0usize;
        for message in &self.messages {
            *message_types
                .entry(message.message_type.as_str().to_string())
                .or_insert(0) += 1;
            vehicles += message.total_vehicles;
            unique.extend(message.vehicles.iter().map(|v| v.id));
        }
        ArchiveSummary {
            total_messages: self.messages.len(),
            message_types,
            avg_vehicles_per_message: if self.messages.is_empty() {
                0.0
            } else {
                vehicles as f64 / self.messages.len() as f64
            },
            total_unique_vehicles: unique.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::{create_broadcast, to_message};
    use shared_types::{BoundingBox, TrackSnapshot};

    fn tracks(ids: &[u64]) -> Vec<TrackSnapshot> {
        ids.iter()
            .map(|&id| TrackSnapshot::new(id, BoundingBox::new(0.0, 0.0, 4.0, 4.0), 1.0, 1, 1))
            .collect()
    }

    #[test]
    fn test_empty_summary() {
        let summary = MessageArchive::new().summary();
        assert_eq!(summary.total_messages, 0);
        assert_eq!(summary.avg_vehicles_per_message, 0.0);
        assert!(summary.message_types.is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let mut archive = MessageArchive::new();
        archive.push(to_message(&tracks(&[1, 2]), 0.0, true));
        archive.push(create_broadcast(&tracks(&[2, 3, 4, 5]), 0.5, None, 300.0));
        let summary = archive.summary();
        assert_eq!(summary.total_messages, 2);
        assert_eq!(summary.message_types["CAM"], 1);
        assert_eq!(summary.message_types["V2X_BROADCAST"], 1);
        assert_eq!(summary.avg_vehicles_per_message, 3.0);
        assert_eq!(summary.total_unique_vehicles, 5);
    }

    #[test]
    fn test_last_n() {
        let mut archive = MessageArchive::new();
        for i in 0..12 {
            archive.push(to_message(&[], i as f64, false));
        }
        let last = archive.last_n(10);
        assert_eq!(last.len(), 10);
        assert_eq!(last[0].timestamp, 2.0);
        assert_eq!(archive.last_n(50).len(), 12);
    }
}
