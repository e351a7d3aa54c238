//! Lineage graph: tracked objects connected by parent-to-child links.

use std::collections::BTreeMap;

use nalgebra::Point2;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use super::DenseIndex;
use crate::record::{ObjectKey, TrackingRecord, TrackingRecordSet};

/// Per-node attributes of the lineage graph.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedNode {
    /// Identity of the object.
    pub key: ObjectKey,
    /// Tracking label assigned upstream.
    pub label: i64,
    /// Object centre, x.
    pub x: f64,
    /// Object centre, y.
    pub y: f64,
    /// Timepoint (frame index).
    pub t: i64,
    /// Value of the dataset measurement as last fetched.
    pub measurement: Option<f64>,
    /// Filter flag as last fetched.
    pub passes_filter: bool,
}

impl TrackedNode {
    /// Node attributes taken from a record.
    pub fn from_record(record: &TrackingRecord) -> Self {
        Self {
            key: record.key,
            label: record.label,
            x: record.x,
            y: record.y,
            t: record.timepoint,
            measurement: record.measurement,
            passes_filter: record.passes_filter,
        }
    }

    /// Spatial position of the object.
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// Whether two nodes describe the same object observation.
    ///
    /// Measurement and filter values are excluded: they are re-bindable
    /// attributes, not part of the observation.
    pub fn same_observation(&self, other: &TrackedNode) -> bool {
        self.key == other.key
            && self.label == other.label
            && self.t == other.t
            && self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
    }
}

/// Directed acyclic lineage graph for one dataset selection.
///
/// Nodes are stored in a `petgraph` arena; a sorted key map provides the
/// canonical node order used by every per-node array.
#[derive(Debug, Clone, Default)]
pub struct LineageGraph {
    graph: DiGraph<TrackedNode, ()>,
    index: BTreeMap<ObjectKey, NodeIndex>,
}

impl LineageGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_node(&mut self, node: TrackedNode) -> NodeIndex {
        let key = node.key;
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        idx
    }

    pub(crate) fn insert_edge(&mut self, parent: NodeIndex, child: NodeIndex) {
        self.graph.update_edge(parent, child, ());
    }

    pub(crate) fn node_index(&self, key: &ObjectKey) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether a node with this key exists.
    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.index.contains_key(key)
    }

    /// Attributes of a node.
    pub fn node(&self, key: &ObjectKey) -> Option<&TrackedNode> {
        self.node_index(key).map(|idx| &self.graph[idx])
    }

    /// Node keys in canonical sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &ObjectKey> + '_ {
        self.index.keys()
    }

    /// Nodes in canonical sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &TrackedNode> + '_ {
        self.index.values().map(move |&idx| &self.graph[idx])
    }

    /// Dense index over the node keys.
    pub fn dense_index(&self) -> DenseIndex {
        DenseIndex::new(self.index.keys().copied())
    }

    fn neighbors(&self, key: &ObjectKey, direction: Direction) -> Vec<ObjectKey> {
        let Some(idx) = self.node_index(key) else {
            return Vec::new();
        };
        let mut keys: Vec<ObjectKey> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].key)
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Children of a node, sorted by key.
    pub fn children(&self, key: &ObjectKey) -> Vec<ObjectKey> {
        self.neighbors(key, Direction::Outgoing)
    }

    /// Parents of a node, sorted by key.
    pub fn parents(&self, key: &ObjectKey) -> Vec<ObjectKey> {
        self.neighbors(key, Direction::Incoming)
    }

    /// Number of incoming links.
    pub fn in_degree(&self, key: &ObjectKey) -> usize {
        self.node_index(key)
            .map_or(0, |idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
    }

    /// Number of outgoing links.
    pub fn out_degree(&self, key: &ObjectKey) -> usize {
        self.node_index(key)
            .map_or(0, |idx| self.graph.neighbors_directed(idx, Direction::Outgoing).count())
    }

    /// All edges as (parent, child), sorted.
    pub fn edges(&self) -> Vec<(ObjectKey, ObjectKey)> {
        let mut edges: Vec<(ObjectKey, ObjectKey)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].key, self.graph[b].key))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Whether the graph contains no directed cycle.
    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Underlying `petgraph` graph.
    pub fn inner(&self) -> &DiGraph<TrackedNode, ()> {
        &self.graph
    }

    /// Re-bind measurement and filter values without touching topology.
    ///
    /// Records for unknown keys are ignored. Returns the number of nodes
    /// updated.
    pub fn update_from_records(&mut self, records: &TrackingRecordSet) -> usize {
        let mut updated = 0;
        for record in records {
            if let Some(&idx) = self.index.get(&record.key) {
                let node = &mut self.graph[idx];
                node.measurement = record.measurement;
                node.passes_filter = record.passes_filter;
                updated += 1;
            }
        }
        updated
    }

    /// Keys of nodes with no incoming link, sorted.
    pub fn start_nodes(&self) -> Vec<ObjectKey> {
        self.keys().filter(|k| self.in_degree(k) == 0).copied().collect()
    }

    /// Keys of nodes with no outgoing link, sorted.
    pub fn end_nodes(&self) -> Vec<ObjectKey> {
        self.keys().filter(|k| self.out_degree(k) == 0).copied().collect()
    }

    /// Keys of division events (more than one outgoing link), sorted.
    pub fn branch_nodes(&self) -> Vec<ObjectKey> {
        self.keys().filter(|k| self.out_degree(k) > 1).copied().collect()
    }
}
