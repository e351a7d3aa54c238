//! Trajectory inclusion state and the pruned display graph.

use std::collections::BTreeMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::components::{ComponentIndex, TrajectoryId};
use crate::graph::{DenseIndex, LineageGraph, TrackedNode};
use crate::record::ObjectKey;
use crate::{Error, Result};

/// Maps every trajectory id to included / excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrajectorySelectionManager {
    included: BTreeMap<TrajectoryId, bool>,
}

impl TrajectorySelectionManager {
    /// Selection over all trajectories of `components`, all included.
    pub fn new(components: &ComponentIndex) -> Self {
        Self {
            included: components.ids().map(|id| (id, true)).collect(),
        }
    }

    /// Replace the selection: exactly the given ids are included.
    ///
    /// Fails with [`Error::UnknownTrajectory`] without changing state when
    /// an id is not part of the dataset.
    pub fn set_selection<I: IntoIterator<Item = TrajectoryId>>(&mut self, ids_to_include: I) -> Result<()> {
        let mut next: BTreeMap<TrajectoryId, bool> = self.included.keys().map(|&id| (id, false)).collect();
        for id in ids_to_include {
            match next.get_mut(&id) {
                Some(flag) => *flag = true,
                None => return Err(Error::UnknownTrajectory(id)),
            }
        }
        self.included = next;
        Ok(())
    }

    /// Include or exclude every trajectory.
    pub fn toggle_all(&mut self, include: bool) {
        for flag in self.included.values_mut() {
            *flag = include;
        }
    }

    /// Whether a trajectory is included. Unknown ids are not.
    pub fn is_included(&self, id: TrajectoryId) -> bool {
        self.included.get(&id).copied().unwrap_or(false)
    }

    /// Included ids in increasing order.
    pub fn included_ids(&self) -> Vec<TrajectoryId> {
        self.included.iter().filter(|(_, inc)| **inc).map(|(&id, _)| id).collect()
    }

    /// Number of managed trajectories.
    pub fn len(&self) -> usize {
        self.included.len()
    }

    /// Whether no trajectories are managed.
    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }

    /// Per-node visibility aligned with sorted node order.
    pub fn visible_mask(&self, graph: &LineageGraph, components: &ComponentIndex) -> Vec<bool> {
        graph
            .keys()
            .map(|k| components.component_of(k).is_some_and(|id| self.is_included(id)))
            .collect()
    }

    /// Relabeled copy of the graph without excluded trajectories.
    ///
    /// The canonical graph is left untouched. Nodes of the copy are numbered
    /// densely in sorted key order and keep their original key.
    pub fn pruned_subgraph(&self, graph: &LineageGraph, components: &ComponentIndex) -> PrunedGraph {
        let kept = graph
            .keys()
            .filter(|k| components.component_of(k).is_some_and(|id| self.is_included(id)))
            .copied();
        let index = DenseIndex::new(kept);

        let mut pruned: DiGraph<TrackedNode, ()> = DiGraph::with_capacity(index.len(), index.len());
        for key in index.keys() {
            if let Some(node) = graph.node(key) {
                pruned.add_node(node.clone());
            }
        }
        for (parent, child) in graph.edges() {
            if let (Some(a), Some(b)) = (index.id(&parent), index.id(&child)) {
                pruned.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
            }
        }

        PrunedGraph { graph: pruned, index }
    }
}

/// Display copy of the lineage graph restricted to included trajectories.
#[derive(Debug, Clone, Default)]
pub struct PrunedGraph {
    graph: DiGraph<TrackedNode, ()>,
    index: DenseIndex,
}

impl PrunedGraph {
    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the copy is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Original key of a relabeled node.
    pub fn original_key(&self, id: usize) -> Option<ObjectKey> {
        self.index.key(id)
    }

    /// Relabeled id of an original key.
    pub fn relabeled_id(&self, key: &ObjectKey) -> Option<usize> {
        self.index.id(key)
    }

    /// Attributes of a relabeled node.
    pub fn node(&self, id: usize) -> Option<&TrackedNode> {
        self.graph.node_weight(NodeIndex::new(id))
    }

    /// Underlying `petgraph` graph, node index == relabeled id.
    pub fn inner(&self) -> &DiGraph<TrackedNode, ()> {
        &self.graph
    }
}
