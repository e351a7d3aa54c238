//! Partition of the lineage graph into trajectories.
//!
//! A trajectory is a connected component of the graph with edge direction
//! ignored. Ids start at 1 and are assigned in order of each component's
//! smallest node key, so they only depend on the graph, never on the order
//! records were delivered in.

use std::collections::{HashMap, VecDeque};

use crate::graph::LineageGraph;
use crate::record::ObjectKey;

/// Integer id of a trajectory, starting at 1.
pub type TrajectoryId = u32;

/// One connected component of the lineage graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trajectory {
    /// Stable id.
    pub id: TrajectoryId,
    /// Member nodes, sorted.
    pub nodes: Vec<ObjectKey>,
    /// Members with no incoming link ("start nodes"), sorted.
    pub roots: Vec<ObjectKey>,
    /// Members with no outgoing link ("end nodes"), sorted.
    pub terminals: Vec<ObjectKey>,
}

impl Trajectory {
    /// Number of member nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the trajectory has no members.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the trajectory is a single object that was never linked.
    pub fn is_singleton(&self) -> bool {
        self.roots.len() == 1 && self.terminals.len() == 1 && self.roots[0] == self.terminals[0]
    }
}

/// Connected components of a [`LineageGraph`] and the inverse node lookup.
#[derive(Debug, Clone, Default)]
pub struct ComponentIndex {
    trajectories: Vec<Trajectory>,
    membership: HashMap<ObjectKey, TrajectoryId>,
}

impl ComponentIndex {
    /// Compute the components in O(V + E).
    pub fn new(graph: &LineageGraph) -> Self {
        let mut trajectories = Vec::new();
        let mut membership: HashMap<ObjectKey, TrajectoryId> = HashMap::with_capacity(graph.node_count());
        let mut queue = VecDeque::new();

        // Keys arrive sorted, so the first unvisited key is the minimum of
        // its component.
        for &seed in graph.keys() {
            if membership.contains_key(&seed) {
                continue;
            }
            let id = trajectories.len() as TrajectoryId + 1;
            let mut nodes = Vec::new();
            membership.insert(seed, id);
            queue.push_back(seed);

            while let Some(key) = queue.pop_front() {
                nodes.push(key);
                for next in graph.parents(&key).into_iter().chain(graph.children(&key)) {
                    if !membership.contains_key(&next) {
                        membership.insert(next, id);
                        queue.push_back(next);
                    }
                }
            }

            nodes.sort_unstable();
            let roots = nodes.iter().filter(|k| graph.in_degree(k) == 0).copied().collect();
            let terminals = nodes.iter().filter(|k| graph.out_degree(k) == 0).copied().collect();
            trajectories.push(Trajectory { id, nodes, roots, terminals });
        }

        Self { trajectories, membership }
    }

    /// Number of trajectories.
    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    /// Whether there are no trajectories.
    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// All trajectory ids in increasing order.
    pub fn ids(&self) -> impl Iterator<Item = TrajectoryId> + '_ {
        self.trajectories.iter().map(|t| t.id)
    }

    /// All trajectories in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, Trajectory> {
        self.trajectories.iter()
    }

    /// Look up a trajectory by id.
    pub fn get(&self, id: TrajectoryId) -> Option<&Trajectory> {
        let pos = (id as usize).checked_sub(1)?;
        self.trajectories.get(pos)
    }

    /// Whether the id names a trajectory.
    pub fn contains(&self, id: TrajectoryId) -> bool {
        self.get(id).is_some()
    }

    /// Member nodes of a trajectory.
    pub fn members(&self, id: TrajectoryId) -> Option<&[ObjectKey]> {
        self.get(id).map(|t| t.nodes.as_slice())
    }

    /// Trajectory a node belongs to.
    pub fn component_of(&self, key: &ObjectKey) -> Option<TrajectoryId> {
        self.membership.get(key).copied()
    }

    /// Start nodes of a trajectory.
    pub fn roots(&self, id: TrajectoryId) -> Option<&[ObjectKey]> {
        self.get(id).map(|t| t.roots.as_slice())
    }

    /// End nodes of a trajectory.
    pub fn terminals(&self, id: TrajectoryId) -> Option<&[ObjectKey]> {
        self.get(id).map(|t| t.terminals.as_slice())
    }

    /// Ids of all singleton trajectories.
    pub fn singletons(&self) -> Vec<TrajectoryId> {
        self.trajectories.iter().filter(|t| t.is_singleton()).map(|t| t.id).collect()
    }
}
