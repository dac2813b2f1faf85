//! Force-directed 3D layout.
//!
//! Positions and velocities live here, keyed by node index into the
//! snapshot's node list. Each frame applies pairwise repulsion, a
//! spring toward the rest link distance, velocity damping, and a
//! per-step displacement clamp. Seeding is deterministic (golden-angle
//! sphere placement from the node index), so the same snapshot always
//! settles into the same shape.

use bevy::prelude::*;
use noema_graph::GraphData;

const GOLDEN_ANGLE: f32 = 2.399_963_2; // radians

/// Spring rest length between linked nodes.
pub const LINK_DISTANCE: f32 = 14.0;
/// Pairwise repulsion strength (inverse-square falloff).
pub const REPULSION: f32 = 420.0;
/// Spring constant.
pub const SPRING_K: f32 = 0.6;
/// Velocity retained per step.
pub const DAMPING: f32 = 0.85;
/// Largest displacement a node may take in one step.
pub const MAX_STEP: f32 = 2.0;
/// Radius of the seeding sphere.
pub const SEED_RADIUS: f32 = 22.0;

/// One undirected edge as indices into the node list, plus the link
/// weight and type for rendering.
#[derive(Debug, Clone)]
pub struct LayoutEdge {
    pub a: usize,
    pub b: usize,
    pub value: f32,
    pub link_type: String,
}

/// Simulation state for the 3D scene.
#[derive(Resource, Default)]
pub struct ForceLayout {
    pub ids: Vec<String>,
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
    pub edges: Vec<LayoutEdge>,
}

impl ForceLayout {
    /// Rebuild the simulation from a snapshot. Dangling link endpoints
    /// are dropped.
    pub fn rebuild(&mut self, data: &GraphData) {
        let n = data.nodes.len();
        self.ids = data.nodes.iter().map(|node| node.id.clone()).collect();
        self.positions = (0..n).map(|i| seed_position(i, n)).collect();
        self.velocities = vec![Vec3::ZERO; n];

        self.edges = data
            .links
            .iter()
            .filter_map(|link| {
                let a = self.ids.iter().position(|id| *id == link.source)?;
                let b = self.ids.iter().position(|id| *id == link.target)?;
                Some(LayoutEdge {
                    a,
                    b,
                    value: link.value,
                    link_type: link.link_type.clone(),
                })
            })
            .collect();
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        let n = self.positions.len();
        if n <= 1 {
            return;
        }

        let mut forces = vec![Vec3::ZERO; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let dir = self.positions[i] - self.positions[j];
                let dist2 = dir.length_squared().max(0.01);
                let f = (REPULSION / dist2) * dir.normalize_or_zero();
                forces[i] += f;
                forces[j] -= f;
            }
        }

        for edge in &self.edges {
            let d = self.positions[edge.b] - self.positions[edge.a];
            let len = d.length().max(0.001);
            let stretch = len - LINK_DISTANCE;
            let f = SPRING_K * stretch * (d / len);
            forces[edge.a] += f;
            forces[edge.b] -= f;
        }

        for i in 0..n {
            let v = (self.velocities[i] + forces[i] * dt) * DAMPING;
            self.velocities[i] = v;

            let mut step = v * dt;
            let len = step.length();
            if len > MAX_STEP {
                step *= MAX_STEP / len;
            }
            self.positions[i] += step;
        }
    }
}

/// Deterministic placement on a sphere: latitude from the index,
/// longitude advancing by the golden angle.
pub fn seed_position(index: usize, count: usize) -> Vec3 {
    if count <= 1 {
        return Vec3::ZERO;
    }
    let y = 1.0 - 2.0 * (index as f32 + 0.5) / count as f32;
    let ring = (1.0 - y * y).max(0.0).sqrt();
    let theta = index as f32 * GOLDEN_ANGLE;
    Vec3::new(ring * theta.cos(), y, ring * theta.sin()) * SEED_RADIUS
}

/// Stable 32-bit hash of a node name, used to derive a per-node hue
/// that survives reloads.
pub fn stable_hash(name: &str) -> u32 {
    let mut hash: u32 = 2166136261;
    for byte in name.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

/// Hue in degrees derived from a node name.
pub fn name_hue(name: &str) -> f32 {
    (stable_hash(name) % 360) as f32
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use noema_graph::{GraphLink, GraphNode};

    fn chain(n: usize) -> GraphData {
        let nodes = (0..n)
            .map(|i| GraphNode::new(format!("n{i}"), format!("Node {i}"), "Entity"))
            .collect();
        let links = (1..n)
            .map(|i| GraphLink::new(format!("n{}", i - 1), format!("n{i}"), "MENTIONS"))
            .collect();
        GraphData { nodes, links }
    }

    #[test]
    fn test_seeding_is_deterministic() {
        let mut a = ForceLayout::default();
        let mut b = ForceLayout::default();
        a.rebuild(&chain(8));
        b.rebuild(&chain(8));
        assert_eq!(a.positions, b.positions);
    }

    #[test]
    fn test_seed_positions_distinct() {
        let mut layout = ForceLayout::default();
        layout.rebuild(&chain(10));
        for i in 0..10 {
            for j in (i + 1)..10 {
                assert!(
                    layout.positions[i].distance(layout.positions[j]) > 1.0,
                    "nodes {i} and {j} seeded on top of each other"
                );
            }
        }
    }

    #[test]
    fn test_step_is_deterministic() {
        let mut a = ForceLayout::default();
        let mut b = ForceLayout::default();
        a.rebuild(&chain(6));
        b.rebuild(&chain(6));
        for _ in 0..50 {
            a.step(1.0 / 60.0);
            b.step(1.0 / 60.0);
        }
        assert_eq!(a.positions, b.positions);
    }

    #[test]
    fn test_springs_pull_linked_nodes_together() {
        let mut layout = ForceLayout::default();
        layout.rebuild(&chain(2));
        // Pull them far apart, then let the spring work.
        layout.positions[0] = Vec3::new(-60.0, 0.0, 0.0);
        layout.positions[1] = Vec3::new(60.0, 0.0, 0.0);
        for _ in 0..600 {
            layout.step(1.0 / 60.0);
        }
        let dist = layout.positions[0].distance(layout.positions[1]);
        assert!(
            (dist - LINK_DISTANCE).abs() < LINK_DISTANCE,
            "settled distance {dist} nowhere near rest length"
        );
    }

    #[test]
    fn test_step_clamps_displacement() {
        let mut layout = ForceLayout::default();
        layout.rebuild(&chain(2));
        layout.positions[0] = Vec3::ZERO;
        layout.positions[1] = Vec3::new(0.05, 0.0, 0.0);

        let before = layout.positions.clone();
        layout.step(1.0);
        for (prev, next) in before.iter().zip(layout.positions.iter()) {
            assert!(prev.distance(*next) <= MAX_STEP + 1e-4);
        }
    }

    #[test]
    fn test_dangling_edges_dropped() {
        let mut data = chain(3);
        data.links.push(GraphLink::new("n0", "ghost", "MENTIONS"));
        let mut layout = ForceLayout::default();
        layout.rebuild(&data);
        assert_eq!(layout.edges.len(), 2);
    }

    #[test]
    fn test_name_hue_stable_and_bounded() {
        assert_eq!(name_hue("alpha"), name_hue("alpha"));
        for name in ["alpha", "beta", "a rather long node name"] {
            let hue = name_hue(name);
            assert!((0.0..360.0).contains(&hue));
        }
        assert_ne!(stable_hash("alpha"), stable_hash("beta"));
    }
}
