//! Twin nodes and the communication graph between them.

use serde::{Deserialize, Serialize};
use shared_types::{VehicleId, VehicleState, WorldBounds, WorldPoint};
use std::collections::HashMap;

/// Last known state of a vehicle in the twin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleNode {
    pub id: VehicleId,
    pub position: WorldPoint,
    pub speed: f64,
    pub angle: f64,
    pub road: Option<String>,
    pub lane: Option<String>,
    pub acceleration: f64,
    pub first_seen_step: u64,
    pub last_seen_step: u64,
}

impl VehicleNode {
    pub fn observe(vehicle: &VehicleState, step: u64) -> Self {
        Self {
            id: vehicle.id.clone(),
            position: vehicle.position(),
            speed: vehicle.speed,
            angle: vehicle.angle,
            road: vehicle.road_id.clone(),
            lane: vehicle.lane_id.clone(),
            acceleration: vehicle.acceleration,
            first_seen_step: step,
            last_seen_step: step,
        }
    }

    /// Refresh from a new observation, keeping `first_seen_step`.
    pub fn refresh(&mut self, vehicle: &VehicleState, step: u64) {
        let first_seen_step = self.first_seen_step;
        *self = Self::observe(vehicle, step);
        self.first_seen_step = first_seen_step;
    }
}

/// Undirected V2V link; `a < b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommLink {
    pub a: VehicleId,
    pub b: VehicleId,
    pub distance_m: f64,
}

/// The twin at one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TwinSnapshot {
    pub step: u64,
    pub time_s: f64,
    /// Ordered by id.
    pub nodes: Vec<VehicleNode>,
    /// Ordered by `(a, b)`.
    pub links: Vec<CommLink>,
}

impl TwinSnapshot {
    /// Area covering every node plus `margin_m`; `None` without nodes.
    pub fn bounds(&self, margin_m: f64) -> Option<WorldBounds> {
        let first = self.nodes.first()?.position;
        let mut b = WorldBounds::new(first.x, first.y, first.x, first.y);
        for node in &self.nodes[1..] {
            b.xmin = b.xmin.min(node.position.x);
            b.ymin = b.ymin.min(node.position.y);
            b.xmax = b.xmax.max(node.position.x);
            b.ymax = b.ymax.max(node.position.y);
        }
        Some(WorldBounds::new(
            b.xmin - margin_m,
            b.ymin - margin_m,
            b.xmax + margin_m,
            b.ymax + margin_m,
        ))
    }
}

/// Aggregate graph figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct TwinStats {
    pub vehicle_count: usize,
    pub link_count: usize,
    pub mean_degree: f64,
    pub isolated_vehicles: usize,
}

impl TwinStats {
    pub fn from_snapshot(snapshot: &TwinSnapshot) -> Self {
        let mut degree: HashMap<&VehicleId, usize> = HashMap::new();
        for link in &snapshot.links {
            *degree.entry(&link.a).or_default() += 1;
            *degree.entry(&link.b).or_default() += 1;
        }
        let vehicle_count = snapshot.nodes.len();
        let link_count = snapshot.links.len();
        Self {
            vehicle_count,
            link_count,
            mean_degree: if vehicle_count == 0 {
                0.0
            } else {
                2.0 * link_count as f64 / vehicle_count as f64
            },
            isolated_vehicles: snapshot
                .nodes
                .iter()
                .filter(|n| !degree.contains_key(&n.id))
                .count(),
        }
    }
}

/// All pairs within `radius_m`, found through a grid of `radius_m` cells.
///
/// Cell indices saturate for coordinates beyond the `i64` range; the
/// distance check stays authoritative.
pub fn build_links(nodes: &[VehicleNode], radius_m: f64) -> Vec<CommLink> {
    let cell = |p: &WorldPoint| {
        (
            (p.x / radius_m).floor() as i64,
            (p.y / radius_m).floor() as i64,
        )
    };

    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        grid.entry(cell(&node.position)).or_default().push(i);
    }

    let mut links = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        let (cx, cy) = cell(&node.position);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let (Some(nx), Some(ny)) = (cx.checked_add(dx), cy.checked_add(dy)) else {
                    continue;
                };
                let Some(bucket) = grid.get(&(nx, ny)) else {
                    continue;
                };
                for &j in bucket {
                    let other = &nodes[j];
                    if other.id <= node.id {
                        continue;
                    }
                    let distance_m = node.position.distance_to(&other.position);
                    if distance_m <= radius_m {
                        links.push(CommLink {
                            a: node.id.clone(),
                            b: other.id.clone(),
                            distance_m,
                        });
                    }
                }
            }
        }
    }
    links.sort_by(|l, r| (&l.a, &l.b).cmp(&(&r.a, &r.b)));
    links
}
