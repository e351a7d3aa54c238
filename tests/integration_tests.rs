//! Integration tests for lineage-rs.
//!
//! These tests verify complete lineage workflows across multiple modules.

use std::cell::Cell;

use approx::assert_relative_eq;
use lineage_rs::{
    ComponentIndex, DatasetSelector, DerivedMeasurementEngine, DerivedMeasurementKind, Error, GapSummary,
    LayeredLayoutEngine, LineageConfig, LineageGraphBuilder, LineageSession, MeasurementChoice, ObjectKey,
    PredictionRow, RelationshipRow, TrackingDataSource, TrackingDiagnostics, TrackingRecord, TrackingRecordSet,
    TrajectorySelectionManager,
};
use nalgebra::Point2;

fn rec(image: i64, object: i64, parent: (i64, i64), t: i64) -> TrackingRecord {
    TrackingRecord::new(
        ObjectKey::new(image, object),
        ObjectKey::from(parent),
        object,
        image as f64 * 2.0,
        object as f64 * 3.0,
        t,
    )
}

/// A lineage dividing twice, a plain lineage and three untracked objects.
fn forest() -> Vec<TrackingRecord> {
    vec![
        rec(1, 1, (0, 0), 0),
        rec(2, 1, (1, 1), 1),
        rec(2, 2, (1, 1), 1),
        rec(3, 1, (2, 1), 2),
        rec(3, 2, (2, 2), 2),
        rec(3, 3, (2, 2), 2),
        rec(1, 4, (0, 0), 0),
        rec(2, 4, (1, 4), 1),
        rec(3, 4, (2, 4), 2),
        rec(2, 7, (0, 0), 1),
        rec(3, 8, (0, 0), 2),
        rec(3, 9, (2, 99), 2),
    ]
}

fn build(records: Vec<TrackingRecord>) -> (lineage_rs::LineageGraph, ComponentIndex) {
    let set: TrackingRecordSet = records.into_iter().collect();
    let (graph, _) = LineageGraphBuilder::new().build(&set).unwrap();
    let components = ComponentIndex::new(&graph);
    (graph, components)
}

// =============================================================================
// Test 1: Graph Size and Acyclicity
// =============================================================================

#[test]
fn test_integration_graph_counts_and_acyclic() {
    let set: TrackingRecordSet = forest().into_iter().collect();
    let (graph, report) = LineageGraphBuilder::new().build(&set).unwrap();

    assert_eq!(graph.node_count(), set.len());
    assert!(graph.edge_count() <= set.parent_link_count());
    assert_eq!(graph.edge_count() + report.dropped_edges(), set.parent_link_count());
    assert_eq!(report.dropped_edges(), 1);
    assert!(graph.is_acyclic());
}

#[test]
fn test_integration_empty_dataset_fails() {
    let err = LineageGraphBuilder::new().build(&TrackingRecordSet::default()).unwrap_err();
    assert!(matches!(err, Error::EmptyGraph(_)));
}

// =============================================================================
// Test 2: Component Stability Under Permutation
// =============================================================================

#[test]
fn test_integration_components_permutation_stable() {
    let (graph, components) = build(forest());
    let mut reversed = forest();
    reversed.reverse();
    let (graph_r, components_r) = build(reversed);

    let mut rotated = forest();
    rotated.rotate_left(5);
    let (_, components_o) = build(rotated);

    assert_eq!(graph.keys().collect::<Vec<_>>(), graph_r.keys().collect::<Vec<_>>());
    assert_eq!(components.len(), components_r.len());
    for id in components.ids() {
        assert_eq!(components.members(id), components_r.members(id));
        assert_eq!(components.members(id), components_o.members(id));
    }
}

// =============================================================================
// Test 3: Singletons
// =============================================================================

#[test]
fn test_integration_singletons_are_root_and_terminal() {
    let (graph, components) = build(forest());
    let derived = DerivedMeasurementEngine::default().compute(&graph, &components).unwrap();

    for (key, &flag) in derived.keys().iter().zip(derived.get(DerivedMeasurementKind::Singletons)) {
        let id = components.component_of(key).unwrap();
        let is_root = components.roots(id).unwrap().contains(key);
        let is_terminal = components.terminals(id).unwrap().contains(key);
        assert_eq!(flag, is_root && is_terminal, "Singleton flag wrong for {}", key);
    }
    assert_eq!(
        derived.flagged(DerivedMeasurementKind::Singletons),
        vec![ObjectKey::new(2, 7), ObjectKey::new(3, 8), ObjectKey::new(3, 9)]
    );
}

// =============================================================================
// Test 4: Layout Separation and Reproducibility
// =============================================================================

#[test]
fn test_integration_layout_division() {
    let (graph, _) = build(vec![rec(1, 1, (0, 0), 0), rec(2, 1, (1, 1), 1), rec(2, 2, (1, 1), 1)]);
    let engine = LayeredLayoutEngine::default();

    let first = engine.compute(&graph);
    let a = first.position(&ObjectKey::new(2, 1)).unwrap();
    let b = first.position(&ObjectKey::new(2, 2)).unwrap();
    assert_relative_eq!(a.x, b.x);
    assert_relative_eq!(a.x, 1.0);
    assert!(a.y != b.y);

    let second = engine.compute(&graph);
    assert_eq!(first, second);
}

#[test]
fn test_integration_layout_forest_reproducible() {
    let (graph, _) = build(forest());
    let mut reversed = forest();
    reversed.reverse();
    let (graph_r, _) = build(reversed);

    let engine = LayeredLayoutEngine::default();
    let layout = engine.compute(&graph);
    let layout_r = engine.compute(&graph_r);
    for (key, p) in layout.iter() {
        let q = layout_r.position(&key).unwrap();
        assert_eq!(p, q, "Position of {} depends on input order", key);
    }
}

// =============================================================================
// Test 5: Pruned Subgraph
// =============================================================================

#[test]
fn test_integration_pruned_subgraph_extremes() {
    let (graph, components) = build(forest());
    let mut selection = TrajectorySelectionManager::new(&components);

    let full = selection.pruned_subgraph(&graph, &components);
    assert_eq!(full.node_count(), graph.node_count());
    assert_eq!(full.edge_count(), graph.edge_count());

    selection.toggle_all(false);
    let empty = selection.pruned_subgraph(&graph, &components);
    assert!(empty.is_empty());
    assert_eq!(empty.edge_count(), 0);

    // Canonical graph survives for re-selection.
    selection.set_selection([1]).unwrap();
    let one = selection.pruned_subgraph(&graph, &components);
    assert_eq!(one.node_count(), components.members(1).unwrap().len());
}

// =============================================================================
// Test 6: Linking Distances
// =============================================================================

#[test]
fn test_integration_linking_distance_known_pair() {
    let diagnostics = TrackingDiagnostics::default();
    let rows = vec![PredictionRow::new(None, Some(Point2::new(0.0, 0.0)), Point2::new(3.0, 4.0))];
    let result = diagnostics.linking_distances(&rows).unwrap();
    assert_eq!(result.distances, vec![5.0]);

    let err = diagnostics.linking_distances(&[]).unwrap_err();
    assert!(matches!(err, Error::NoLinkingData));
}

// =============================================================================
// Test 7: Gap Lengths
// =============================================================================

#[test]
fn test_integration_unit_gaps_are_no_gaps() {
    let rows: Vec<RelationshipRow> = (1..6)
        .map(|i| RelationshipRow::new(ObjectKey::new(i, 1), ObjectKey::new(i + 1, 1), i, i + 1))
        .collect();
    let summary = TrackingDiagnostics::default().gap_lengths(&rows).unwrap();
    assert_eq!(summary, GapSummary::NoGaps { links: 5 });
    assert!(!summary.has_gaps());
}

// =============================================================================
// Test 8: Session Caching
// =============================================================================

struct MemorySource {
    records: Vec<TrackingRecord>,
    fetches: Cell<usize>,
}

impl MemorySource {
    fn new(records: Vec<TrackingRecord>) -> Self {
        Self {
            records,
            fetches: Cell::new(0),
        }
    }
}

impl TrackingDataSource for MemorySource {
    fn fetch_tracking_rows(
        &self,
        _dataset: &DatasetSelector,
        measurement: Option<&str>,
        filter: Option<&str>,
    ) -> lineage_rs::Result<TrackingRecordSet> {
        self.fetches.set(self.fetches.get() + 1);
        Ok(self
            .records
            .iter()
            .map(|r| {
                let value = measurement.map(|_| r.key.object as f64);
                let passes = filter.map_or(true, |_| r.key.object % 2 == 1);
                r.clone().with_measurement(value).with_filter(passes)
            })
            .collect())
    }

    fn fetch_relationship_rows(&self, _dataset: &DatasetSelector) -> lineage_rs::Result<Vec<RelationshipRow>> {
        Ok(self
            .records
            .iter()
            .filter(|r| !r.is_root())
            .map(|r| RelationshipRow::new(r.parent, r.key, r.parent.image, r.key.image))
            .collect())
    }

    fn fetch_prediction_rows(&self, _dataset: &DatasetSelector) -> lineage_rs::Result<Vec<PredictionRow>> {
        Ok(Vec::new())
    }
}

#[test]
fn test_integration_session_refresh_flow() {
    let source = MemorySource::new(forest());
    let mut session = LineageSession::new(LineageConfig::default()).unwrap();

    assert!(matches!(session.refresh(&source), Err(Error::EmptyGraph(_))));

    session.set_dataset(DatasetSelector::parse("1"));
    session.set_measurement(Some(MeasurementChoice::parse("AreaShape_Area")));
    let applied = session.refresh(&source).unwrap();
    assert!(applied.dataset);
    assert!(!session.updates().any());
    assert_eq!(source.fetches.get(), 1);
    assert_eq!(session.graph().unwrap().node_count(), 12);
    assert_eq!(session.coloring().unwrap().unwrap().value(&ObjectKey::new(3, 4)), Some(4.0));

    // Switching to a derived measurement needs no fetch.
    session.set_measurement(Some(MeasurementChoice::parse("Singletons")));
    let applied = session.refresh(&source).unwrap();
    assert!(applied.measurement && !applied.dataset);
    assert_eq!(source.fetches.get(), 1);
    let coloring = session.coloring().unwrap().unwrap();
    assert_eq!(coloring.name(), "Singletons");
    assert_eq!(coloring.value(&ObjectKey::new(2, 7)), Some(1.0));

    // Filter change re-binds attributes without rebuilding topology.
    let edges = session.graph().unwrap().edge_count();
    session.set_filter(Some("odd objects".to_string()));
    session.refresh(&source).unwrap();
    assert_eq!(source.fetches.get(), 2);
    let graph = session.graph().unwrap();
    assert_eq!(graph.edge_count(), edges);
    assert!(!graph.node(&ObjectKey::new(2, 2)).unwrap().passes_filter);

    // Selection.
    session.set_selection([2]).unwrap();
    assert!(session.updates().trajectories);
    assert_eq!(session.pruned_subgraph().unwrap().node_count(), 3);
    assert!(matches!(session.set_selection([77]), Err(Error::UnknownTrajectory(77))));

    // Diagnostics.
    let report = session.diagnostics(&source).unwrap();
    assert!(report.linking.is_none());
    assert_eq!(report.gaps.as_ref().map(GapSummary::links), Some(8));
}
