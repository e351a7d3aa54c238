//! Quality-control measurements derived from lineage topology.
//!
//! Derived measurements are per-node flags computed from the graph alone.
//! They are stored aligned with the sorted node order so they can be used
//! directly as a coloring channel next to dataset measurements.
//!
//! - `NodesWithinDistanceCutoff` - short branch-to-leaf fragments near divisions
//! - `Singletons` - objects never linked across frames

mod branch_proximity;
mod coloring;
mod singletons;

pub use coloring::ColoringChannel;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Instant;

use log::info;
use serde::{Deserialize, Serialize};

use crate::components::{ComponentIndex, TrajectoryId};
use crate::config::MeasurementConfig;
use crate::graph::{DenseIndex, LineageGraph};
use crate::record::ObjectKey;
use crate::{Error, Result};

/// Names of the topology-derived measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DerivedMeasurementKind {
    /// Node lies on a short path from a branch point to a non-terminal leaf.
    NodesWithinDistanceCutoff,
    /// Node is the only member of its trajectory.
    Singletons,
}

impl DerivedMeasurementKind {
    /// All derived measurements.
    pub const ALL: [DerivedMeasurementKind; 2] = [
        DerivedMeasurementKind::NodesWithinDistanceCutoff,
        DerivedMeasurementKind::Singletons,
    ];

    /// Display name, as offered next to dataset measurements.
    pub fn name(&self) -> &'static str {
        match self {
            DerivedMeasurementKind::NodesWithinDistanceCutoff => "NodesWithinDistanceCutoff",
            DerivedMeasurementKind::Singletons => "Singletons",
        }
    }

    /// Look up a derived measurement by display name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| Error::UnknownMeasurement(name.to_string()))
    }
}

impl fmt::Display for DerivedMeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Derived measurement arrays aligned to sorted node order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedMeasurements {
    index: DenseIndex,
    values: BTreeMap<DerivedMeasurementKind, Vec<bool>>,
    branch_points: BTreeMap<TrajectoryId, Vec<ObjectKey>>,
    terminal_frame_nodes: Vec<ObjectKey>,
}

impl DerivedMeasurements {
    /// Flags for one measurement, aligned with sorted node order.
    pub fn get(&self, kind: DerivedMeasurementKind) -> &[bool] {
        self.values.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Flags as 0.0 / 1.0 scalars for coloring.
    pub fn scalars(&self, kind: DerivedMeasurementKind) -> Vec<f64> {
        self.get(kind).iter().map(|&b| if b { 1.0 } else { 0.0 }).collect()
    }

    /// Flag of one node.
    pub fn value(&self, kind: DerivedMeasurementKind, key: &ObjectKey) -> Option<bool> {
        let id = self.index.id(key)?;
        self.get(kind).get(id).copied()
    }

    /// Keys the arrays are aligned with.
    pub fn keys(&self) -> &[ObjectKey] {
        self.index.keys()
    }

    /// Keys flagged by one measurement, sorted.
    pub fn flagged(&self, kind: DerivedMeasurementKind) -> Vec<ObjectKey> {
        self.index
            .keys()
            .iter()
            .zip(self.get(kind))
            .filter(|(_, b)| **b)
            .map(|(&k, _)| k)
            .collect()
    }

    /// Division events per trajectory.
    pub fn branch_points(&self, id: TrajectoryId) -> &[ObjectKey] {
        self.branch_points.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// End nodes in the last frame reached by any trajectory.
    pub fn terminal_frame_nodes(&self) -> &[ObjectKey] {
        &self.terminal_frame_nodes
    }
}

/// Computes [`DerivedMeasurements`] from a graph and its components.
#[derive(Debug, Clone, Default)]
pub struct DerivedMeasurementEngine {
    config: MeasurementConfig,
}

impl DerivedMeasurementEngine {
    /// Create an engine, validating the configuration.
    pub fn new(config: MeasurementConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Compute all derived measurements.
    ///
    /// Fails with [`Error::EmptyGraph`] when the graph has no terminal nodes.
    pub fn compute(&self, graph: &LineageGraph, components: &ComponentIndex) -> Result<DerivedMeasurements> {
        info!("Calculating derived measurements");
        let started = Instant::now();

        let terminal = branch_proximity::terminal_frame_nodes(graph)?;
        let near_branch = branch_proximity::nodes_within_distance_cutoff(graph, &terminal, self.config.branch_cutoff);
        let singletons = singletons::singleton_nodes(components);

        let index = graph.dense_index();
        let align = |set: &BTreeSet<ObjectKey>| -> Vec<bool> { index.keys().iter().map(|k| set.contains(k)).collect() };

        let mut values = BTreeMap::new();
        values.insert(DerivedMeasurementKind::NodesWithinDistanceCutoff, align(&near_branch));
        values.insert(DerivedMeasurementKind::Singletons, align(&singletons));

        let mut branch_points: BTreeMap<TrajectoryId, Vec<ObjectKey>> =
            components.ids().map(|id| (id, Vec::new())).collect();
        for key in graph.branch_nodes() {
            if let Some(id) = components.component_of(&key) {
                branch_points.entry(id).or_default().push(key);
            }
        }

        info!(
            "Computed derived measurements ({:.2} sec)",
            started.elapsed().as_secs_f64()
        );

        Ok(DerivedMeasurements {
            index,
            values,
            branch_points,
            terminal_frame_nodes: terminal.into_iter().collect(),
        })
    }
}
