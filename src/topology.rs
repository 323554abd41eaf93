//! Neighborhood topologies: who may exchange energy and messages with whom.
//!
//! Every topology places agents at 2-D positions and links two agents when
//! their distance is within a radius. Distance is symmetric, so the neighbor
//! relation is too.

use rand::{Rng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::SwarmError;

/// Distance function between agent positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// `|dx| + |dy|`.
    #[default]
    Manhattan,
    /// `sqrt(dx² + dy²)`.
    Euclidean,
}

impl DistanceMetric {
    /// Distance between two points.
    pub fn distance(self, a: (f32, f32), b: (f32, f32)) -> f32 {
        let dx = a.0 - b.0;
        let dy = a.1 - b.1;
        match self {
            Self::Manhattan => dx.abs() + dy.abs(),
            Self::Euclidean => (dx * dx + dy * dy).sqrt(),
        }
    }
}

/// Rule used to place agents and link neighbors.
#[derive(Debug, Clone, PartialEq)]
pub enum Topology {
    /// Agents on a line; `i` and `j` are neighbors when `|i - j| <= window`.
    IndexWindow {
        /// Maximum index distance.
        window: usize,
    },
    /// Agent `i` at `(i / cols, i % cols)`, linked within a Manhattan radius.
    Grid {
        /// Grid width.
        cols: usize,
        /// Maximum Manhattan distance.
        radius: f32,
    },
    /// Uniform random positions in `[0, extent)²`.
    Random {
        /// Side length of the placement square.
        extent: f32,
        /// Maximum distance.
        radius: f32,
        /// Distance function.
        metric: DistanceMetric,
    },
}

impl Default for Topology {
    fn default() -> Self {
        Self::IndexWindow { window: 2 }
    }
}

impl Topology {
    /// Checks parameters before any positions are generated.
    pub fn validate(&self) -> Result<(), SwarmError> {
        let invalid = |reason: String| Err(SwarmError::InvalidTopology { reason });
        match *self {
            Self::IndexWindow { .. } => Ok(()),
            Self::Grid { cols, radius } => {
                if cols == 0 {
                    return invalid("grid needs at least one column".into());
                }
                check_radius(radius)
            }
            Self::Random { extent, radius, .. } => {
                if !(extent.is_finite() && extent > 0.0) {
                    return invalid(format!("extent must be a positive number, got {extent}"));
                }
                check_radius(radius)
            }
        }
    }

    fn metric(&self) -> DistanceMetric {
        match self {
            Self::Random { metric, .. } => *metric,
            _ => DistanceMetric::Manhattan,
        }
    }

    fn radius(&self) -> f32 {
        match *self {
            Self::IndexWindow { window } => window as f32,
            Self::Grid { radius, .. } | Self::Random { radius, .. } => radius,
        }
    }

    fn positions(&self, num_agents: usize, rng: &mut StdRng) -> Vec<(f32, f32)> {
        match *self {
            Self::IndexWindow { .. } => (0..num_agents).map(|i| (0.0, i as f32)).collect(),
            Self::Grid { cols, .. } => (0..num_agents)
                .map(|i| ((i / cols) as f32, (i % cols) as f32))
                .collect(),
            Self::Random { extent, .. } => (0..num_agents)
                .map(|_| (rng.random_range(0.0..extent), rng.random_range(0.0..extent)))
                .collect(),
        }
    }
}

fn check_radius(radius: f32) -> Result<(), SwarmError> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err(SwarmError::InvalidTopology {
            reason: format!("radius must be a non-negative number, got {radius}"),
        })
    }
}

/// Fixed adjacency among the agents of one simulation.
#[derive(Debug, Clone)]
pub struct Neighborhood {
    positions: Vec<(f32, f32)>,
    metric: DistanceMetric,
    adjacency: Vec<Vec<AgentId>>,
}

impl Neighborhood {
    /// Places `num_agents` agents and links them using the topology's radius.
    ///
    /// `rng` is only drawn from by [`Topology::Random`].
    pub fn build(topology: &Topology, num_agents: usize, rng: &mut StdRng) -> Result<Self, SwarmError> {
        topology.validate()?;
        let mut neighborhood = Self {
            positions: topology.positions(num_agents, rng),
            metric: topology.metric(),
            adjacency: Vec::new(),
        };
        let radius = topology.radius();
        neighborhood.adjacency = (0..num_agents)
            .map(|id| neighborhood.get_neighbors(id, radius))
            .collect();
        Ok(neighborhood)
    }

    /// Number of agents placed.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` when no agents were placed.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Neighbors of `agent_id` under the topology's own radius, ascending.
    pub fn neighbors(&self, agent_id: AgentId) -> &[AgentId] {
        self.adjacency.get(agent_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Agents within `radius` of `agent_id`, excluding itself, ascending by id.
    pub fn get_neighbors(&self, agent_id: AgentId, radius: f32) -> Vec<AgentId> {
        let Some(&origin) = self.positions.get(agent_id) else {
            return Vec::new();
        };
        self.positions
            .iter()
            .enumerate()
            .filter(|&(j, &p)| j != agent_id && self.metric.distance(origin, p) <= radius)
            .map(|(j, _)| j)
            .collect()
    }

    /// Distance between two agents, if both exist.
    pub fn distance(&self, a: AgentId, b: AgentId) -> Option<f32> {
        Some(self.metric.distance(*self.positions.get(a)?, *self.positions.get(b)?))
    }

    /// Agent positions, indexed by id.
    pub fn positions(&self) -> &[(f32, f32)] {
        &self.positions
    }

    /// Number of undirected links.
    pub fn connection_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn build(topology: Topology, n: usize) -> Neighborhood {
        let mut rng = StdRng::seed_from_u64(7);
        Neighborhood::build(&topology, n, &mut rng).unwrap()
    }

    fn assert_symmetric(hood: &Neighborhood) {
        for a in 0..hood.len() {
            for &b in hood.neighbors(a) {
                assert!(hood.neighbors(b).contains(&a), "{a} -> {b} is one-way");
            }
        }
    }

    #[test]
    fn index_window_links_two_each_side() {
        let hood = build(Topology::default(), 10);
        assert_eq!(hood.neighbors(0), &[1, 2]);
        assert_eq!(hood.neighbors(5), &[3, 4, 6, 7]);
        assert_eq!(hood.neighbors(9), &[7, 8]);
        assert_symmetric(&hood);
    }

    #[test]
    fn single_agent_is_isolated() {
        let hood = build(Topology::default(), 1);
        assert!(hood.neighbors(0).is_empty());
        assert_eq!(hood.connection_count(), 0);
    }

    #[test]
    fn grid_uses_manhattan_radius() {
        let hood = build(Topology::Grid { cols: 3, radius: 1.0 }, 9);
        // 0 1 2
        // 3 4 5
        // 6 7 8
        assert_eq!(hood.neighbors(4), &[1, 3, 5, 7]);
        assert_eq!(hood.neighbors(0), &[1, 3]);
        assert_eq!(hood.get_neighbors(0, 2.0), vec![1, 2, 3, 4, 6]);
        assert_eq!(hood.distance(0, 8), Some(4.0));
        assert_symmetric(&hood);
    }

    #[test]
    fn random_topology_is_symmetric_and_seeded() {
        let topology = Topology::Random {
            extent: 10.0,
            radius: 4.0,
            metric: DistanceMetric::Euclidean,
        };
        let a = build(topology.clone(), 30);
        let b = build(topology, 30);
        assert_symmetric(&a);
        assert_eq!(a.positions(), b.positions());
        for id in 0..30 {
            assert!(!a.neighbors(id).contains(&id));
            assert!(a.neighbors(id).windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn malformed_parameters_are_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        for topology in [
            Topology::Grid { cols: 0, radius: 1.0 },
            Topology::Grid { cols: 3, radius: -1.0 },
            Topology::Random {
                extent: 0.0,
                radius: 1.0,
                metric: DistanceMetric::Manhattan,
            },
            Topology::Random {
                extent: 5.0,
                radius: f32::NAN,
                metric: DistanceMetric::Manhattan,
            },
        ] {
            assert!(matches!(
                Neighborhood::build(&topology, 4, &mut rng),
                Err(SwarmError::InvalidTopology { .. })
            ));
        }
    }

    #[test]
    fn unknown_agent_has_no_neighbors() {
        let hood = build(Topology::default(), 3);
        assert!(hood.neighbors(10).is_empty());
        assert!(hood.get_neighbors(10, 5.0).is_empty());
        assert_eq!(hood.distance(0, 10), None);
    }
}
