//! Digital Twin Service
//!
//! Keeps the latest state of every vehicle and the V2V links between them.

use shared_types::{SimulationFrame, VehicleId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::domain::{build_links, CommLink, TwinConfig, TwinSnapshot, TwinStats, VehicleNode};
use crate::error::TwinError;
use crate::ports::DigitalTwinApi;

pub struct DigitalTwin {
    config: TwinConfig,
    nodes: BTreeMap<VehicleId, VehicleNode>,
    links: Vec<CommLink>,
    adjacency: BTreeMap<VehicleId, BTreeSet<VehicleId>>,
    step: u64,
    time_s: f64,
}

impl DigitalTwin {
    pub fn new(config: TwinConfig) -> Result<Self, TwinError> {
        config.validate()?;
        Ok(Self {
            config,
            nodes: BTreeMap::new(),
            links: Vec::new(),
            adjacency: BTreeMap::new(),
            step: 0,
            time_s: 0.0,
        })
    }

    pub fn config(&self) -> &TwinConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn rebuild_links(&mut self) {
        let nodes: Vec<VehicleNode> = self.nodes.values().cloned().collect();
        self.links = build_links(&nodes, self.config.comm_radius_m);

        self.adjacency.clear();
        for link in &self.links {
            self.adjacency
                .entry(link.a.clone())
                .or_default()
                .insert(link.b.clone());
            self.adjacency
                .entry(link.b.clone())
                .or_default()
                .insert(link.a.clone());
        }
    }
}

impl DigitalTwinApi for DigitalTwin {
    fn apply_frame(&mut self, frame: &SimulationFrame) -> TwinSnapshot {
        self.step = frame.step;
        self.time_s = frame.time_s;

        for vehicle in &frame.vehicles {
            match self.nodes.get_mut(&vehicle.id) {
                Some(node) => node.refresh(vehicle, frame.step),
                None => {
                    self.nodes
                        .insert(vehicle.id.clone(), VehicleNode::observe(vehicle, frame.step));
                }
            }
        }

        let keep_for = self.config.stale_after_steps;
        let before = self.nodes.len();
        self.nodes
            .retain(|_, node| frame.step.saturating_sub(node.last_seen_step) <= keep_for);
        let departed = before - self.nodes.len();

        self.rebuild_links();
        debug!(
            step = frame.step,
            vehicles = self.nodes.len(),
            links = self.links.len(),
            departed,
            "Twin updated"
        );
        self.snapshot()
    }

    fn neighbors(&self, id: &VehicleId) -> Result<Vec<VehicleId>, TwinError> {
        if !self.nodes.contains_key(id) {
            return Err(TwinError::UnknownVehicle(id.clone()));
        }
        Ok(self
            .adjacency
            .get(id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn node(&self, id: &VehicleId) -> Option<&VehicleNode> {
        self.nodes.get(id)
    }

    fn snapshot(&self) -> TwinSnapshot {
        TwinSnapshot {
            step: self.step,
            time_s: self.time_s,
            nodes: self.nodes.values().cloned().collect(),
            links: self.links.clone(),
        }
    }

    fn stats(&self) -> TwinStats {
        TwinStats::from_snapshot(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::VehicleState;

    fn frame(step: u64, vehicles: Vec<VehicleState>) -> SimulationFrame {
        SimulationFrame::new(step, step as f64 * 0.1, vehicles)
    }

    #[test]
    fn test_apply_frame_builds_graph() {
        let mut twin = DigitalTwin::new(TwinConfig::default()).unwrap();
        let snapshot = twin.apply_frame(&frame(
            0,
            vec![
                VehicleState::new("veh_2", 0.0, 0.0, 10.0, 0.0),
                VehicleState::new("veh_1", 60.0, 0.0, 10.0, 0.0),
                VehicleState::new("veh_3", 400.0, 0.0, 10.0, 0.0),
            ],
        ));
        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.nodes[0].id.as_str(), "veh_1");
        assert_eq!(snapshot.links.len(), 1);
        assert_eq!(snapshot.links[0].a.as_str(), "veh_1");

        assert_eq!(
            twin.neighbors(&VehicleId::new("veh_2")).unwrap(),
            vec![VehicleId::new("veh_1")]
        );
        assert!(twin.neighbors(&VehicleId::new("veh_3")).unwrap().is_empty());
        assert_eq!(
            twin.neighbors(&VehicleId::new("ghost")),
            Err(TwinError::UnknownVehicle(VehicleId::new("ghost")))
        );
    }

    #[test]
    fn test_departed_vehicles_removed() {
        let mut twin = DigitalTwin::new(TwinConfig::default()).unwrap();
        twin.apply_frame(&frame(
            0,
            vec![
                VehicleState::new("a", 0.0, 0.0, 1.0, 0.0),
                VehicleState::new("b", 10.0, 0.0, 1.0, 0.0),
            ],
        ));
        let snapshot = twin.apply_frame(&frame(1, vec![VehicleState::new("a", 1.0, 0.0, 1.0, 0.0)]));
        assert_eq!(snapshot.nodes.len(), 1);
        assert!(snapshot.links.is_empty());
        assert!(twin.node(&VehicleId::new("b")).is_none());
        assert_eq!(twin.node(&VehicleId::new("a")).unwrap().first_seen_step, 0);
    }

    #[test]
    fn test_stale_vehicles_kept_for_configured_steps() {
        let mut twin = DigitalTwin::new(TwinConfig::default().with_stale_after(2)).unwrap();
        twin.apply_frame(&frame(0, vec![VehicleState::new("a", 0.0, 0.0, 1.0, 0.0)]));
        twin.apply_frame(&frame(1, vec![]));
        twin.apply_frame(&frame(2, vec![]));
        assert_eq!(twin.len(), 1);
        twin.apply_frame(&frame(3, vec![]));
        assert!(twin.is_empty());
    }

    #[test]
    fn test_stats_follow_twin() {
        let mut twin = DigitalTwin::new(TwinConfig::default().with_comm_radius(50.0)).unwrap();
        twin.apply_frame(&frame(
            0,
            vec![
                VehicleState::new("a", 0.0, 0.0, 1.0, 0.0),
                VehicleState::new("b", 30.0, 0.0, 1.0, 0.0),
                VehicleState::new("c", 30.0, 30.0, 1.0, 0.0),
            ],
        ));
        let stats = twin.stats();
        assert_eq!(stats.vehicle_count, 3);
        assert_eq!(stats.link_count, 3);
        assert_eq!(stats.mean_degree, 2.0);
        assert_eq!(stats.isolated_vehicles, 0);
    }

    #[test]
    fn test_rejects_zero_radius() {
        assert!(DigitalTwin::new(TwinConfig::default().with_comm_radius(0.0)).is_err());
    }
}
