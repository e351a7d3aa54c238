//! Layered (Sugiyama-style) layout of the lineage graph.
//!
//! The horizontal axis is the timepoint; every node at the same timepoint
//! shares a layer. The vertical ("separation") axis keeps trajectories and
//! sibling branches apart. The pipeline is:
//!
//! 1. Relabel nodes to dense ids in sorted key order
//! 2. Order each layer to reduce edge crossings (barycenter heuristic)
//! 3. Assign separation-axis values with median refinement
//! 4. Normalize so the separation span equals the timepoint span
//!
//! Every step iterates sorted sequences, so the output is bit-for-bit
//! reproducible for the same graph.

mod coordinates;
mod ordering;

use std::time::Instant;

use log::info;
use nalgebra::Point2;

use crate::config::LayoutConfig;
use crate::graph::{DenseIndex, LineageGraph};
use crate::record::ObjectKey;
use crate::Result;

use coordinates::{aspect_scale, assign_separation, span};
use ordering::{minimize_crossings, LayerGraph};

/// Layout result: one `(t, y)` coordinate per node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineageLayout {
    index: DenseIndex,
    positions: Vec<Point2<f64>>,
    y_scale: f64,
    crossings: usize,
}

impl LineageLayout {
    /// Number of positioned nodes.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the layout is empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position of a node as `(t, y)`.
    pub fn position(&self, key: &ObjectKey) -> Option<Point2<f64>> {
        self.index.id(key).map(|i| self.positions[i])
    }

    /// Positions aligned with sorted node order.
    pub fn positions(&self) -> &[Point2<f64>] {
        &self.positions
    }

    /// Iterate `(key, position)` pairs in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, Point2<f64>)> + '_ {
        self.index.keys().iter().copied().zip(self.positions.iter().copied())
    }

    /// Factor applied to the separation axis during normalization.
    pub fn y_scale(&self) -> f64 {
        self.y_scale
    }

    /// Edge crossings left after ordering.
    pub fn crossings(&self) -> usize {
        self.crossings
    }
}

/// Computes [`LineageLayout`]s.
#[derive(Debug, Clone, Default)]
pub struct LayeredLayoutEngine {
    config: LayoutConfig,
}

impl LayeredLayoutEngine {
    /// Create an engine, validating the configuration.
    pub fn new(config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The engine configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out the graph. An empty graph yields an empty layout.
    pub fn compute(&self, graph: &LineageGraph) -> LineageLayout {
        let started = Instant::now();

        let layer_graph = LayerGraph::from_lineage(graph);
        if layer_graph.len() == 0 {
            return LineageLayout {
                y_scale: 1.0,
                ..LineageLayout::default()
            };
        }

        let (order, crossings) = minimize_crossings(&layer_graph, self.config.ordering_sweeps);
        let y = assign_separation(
            &layer_graph,
            &order,
            self.config.min_separation,
            self.config.refinement_passes,
        );

        let (t_min, t_max) = span(layer_graph.t.iter().map(|&t| t as f64)).unwrap_or((0.0, 0.0));
        let (y_min, y_max) = span(y.iter().copied()).unwrap_or((0.0, 0.0));
        let y_scale = aspect_scale(t_max - t_min, y_max - y_min);

        let positions = layer_graph
            .t
            .iter()
            .zip(y.iter())
            .map(|(&t, &yv)| Point2::new(t as f64, (yv - y_min) * y_scale))
            .collect();

        info!(
            "Computed lineage layout ({:.2} sec, {} crossings)",
            started.elapsed().as_secs_f64(),
            crossings
        );

        LineageLayout {
            index: layer_graph.index,
            positions,
            y_scale,
            crossings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LineageGraphBuilder;
    use crate::record::{TrackingRecord, TrackingRecordSet};
    use approx::assert_relative_eq;

    fn rec(image: i64, object: i64, parent: (i64, i64), t: i64) -> TrackingRecord {
        TrackingRecord::new(ObjectKey::new(image, object), ObjectKey::from(parent), object, 0.0, 0.0, t)
    }

    fn build(records: Vec<TrackingRecord>) -> LineageGraph {
        let set: TrackingRecordSet = records.into_iter().collect();
        LineageGraphBuilder::new().build(&set).unwrap().0
    }

    #[test]
    fn test_division_children_are_separated() {
        let graph = build(vec![rec(1, 1, (0, 0), 0), rec(2, 1, (1, 1), 1), rec(2, 2, (1, 1), 1)]);
        let layout = LayeredLayoutEngine::default().compute(&graph);

        let a = layout.position(&ObjectKey::new(2, 1)).unwrap();
        let b = layout.position(&ObjectKey::new(2, 2)).unwrap();
        assert_relative_eq!(a.x, 1.0);
        assert_relative_eq!(b.x, 1.0);
        assert!(a.y != b.y);
        assert_eq!(layout.crossings(), 0);
    }

    #[test]
    fn test_layout_is_reproducible() {
        let records = vec![
            rec(1, 1, (0, 0), 0),
            rec(1, 2, (0, 0), 0),
            rec(2, 1, (1, 1), 1),
            rec(2, 2, (1, 1), 1),
            rec(2, 3, (1, 2), 1),
            rec(4, 1, (2, 3), 3),
            rec(4, 2, (2, 1), 3),
        ];
        let graph = build(records.clone());
        let mut reversed = records;
        reversed.reverse();
        let graph_reversed = build(reversed);

        let engine = LayeredLayoutEngine::default();
        let first = engine.compute(&graph);
        let second = engine.compute(&graph);
        let third = engine.compute(&graph_reversed);

        let bits = |l: &LineageLayout| -> Vec<(u64, u64)> {
            l.positions().iter().map(|p| (p.x.to_bits(), p.y.to_bits())).collect()
        };
        assert_eq!(bits(&first), bits(&second));
        assert_eq!(bits(&first), bits(&third));
    }

    #[test]
    fn test_aspect_normalized() {
        let graph = build(vec![
            rec(1, 1, (0, 0), 0),
            rec(2, 1, (1, 1), 4),
            rec(2, 2, (1, 1), 4),
            rec(1, 3, (0, 0), 0),
        ]);
        let layout = LayeredLayoutEngine::default().compute(&graph);
        let ys: Vec<f64> = layout.positions().iter().map(|p| p.y).collect();
        let (lo, hi) = span(ys).unwrap();
        assert_relative_eq!(lo, 0.0);
        assert_relative_eq!(hi, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_layer_degenerate_span() {
        let graph = build(vec![rec(1, 1, (0, 0), 0)]);
        let layout = LayeredLayoutEngine::default().compute(&graph);
        assert_relative_eq!(layout.y_scale(), 1.0);
        let p = layout.position(&ObjectKey::new(1, 1)).unwrap();
        assert!(p.x.is_finite() && p.y.is_finite());
    }

    #[test]
    fn test_empty_graph_layout() {
        let layout = LayeredLayoutEngine::default().compute(&LineageGraph::new());
        assert!(layout.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = LayoutConfig {
            min_separation: 0.0,
            ..LayoutConfig::default()
        };
        assert!(LayeredLayoutEngine::new(config).is_err());
    }
}
