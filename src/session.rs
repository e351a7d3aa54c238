//! Session state tying the data source, graph pipeline and selection together.
//!
//! A session caches the graph, its layout and derived measurements for one
//! dataset. Changing the measurement or filter only re-binds node attributes
//! and the coloring channel; only a dataset change rebuilds the graph.

use std::time::Instant;

use log::{debug, info};

use crate::components::{ComponentIndex, TrajectoryId};
use crate::config::LineageConfig;
use crate::diagnostics::{DiagnosticsReport, PredictionRow, RelationshipRow, TrackingDiagnostics};
use crate::graph::{BuildReport, LineageGraph, LineageGraphBuilder};
use crate::layout::{LayeredLayoutEngine, LineageLayout};
use crate::measurements::{ColoringChannel, DerivedMeasurementEngine, DerivedMeasurementKind, DerivedMeasurements};
use crate::record::{DatasetSelector, TrackingRecordSet};
use crate::selection::{PrunedGraph, TrajectorySelectionManager};
use crate::{Error, Result};

/// Access to the tracking tables of the external storage layer.
pub trait TrackingDataSource {
    /// One record per object of the dataset, optionally carrying a
    /// measurement column and a filter result.
    fn fetch_tracking_rows(
        &self,
        dataset: &DatasetSelector,
        measurement: Option<&str>,
        filter: Option<&str>,
    ) -> Result<TrackingRecordSet>;

    /// Cross-frame parent/child relationships of the dataset.
    fn fetch_relationship_rows(&self, dataset: &DatasetSelector) -> Result<Vec<RelationshipRow>>;

    /// Predicted vs. observed positions of the dataset's links.
    fn fetch_prediction_rows(&self, dataset: &DatasetSelector) -> Result<Vec<PredictionRow>>;
}

/// Measurement used to color the plots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasurementChoice {
    /// A measurement column stored with the objects.
    Dataset(String),
    /// A measurement derived from lineage topology.
    Derived(DerivedMeasurementKind),
}

impl MeasurementChoice {
    /// Derived measurement if `name` is one, dataset column otherwise.
    pub fn parse(name: &str) -> Self {
        match DerivedMeasurementKind::from_name(name) {
            Ok(kind) => MeasurementChoice::Derived(kind),
            Err(_) => MeasurementChoice::Dataset(name.to_string()),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            MeasurementChoice::Dataset(name) => name.as_str(),
            MeasurementChoice::Derived(kind) => kind.name(),
        }
    }

    fn dataset_column(&self) -> Option<&str> {
        match self {
            MeasurementChoice::Dataset(name) => Some(name.as_str()),
            MeasurementChoice::Derived(_) => None,
        }
    }
}

/// What changed since the last refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlotUpdates {
    /// Another dataset was selected; the graph is rebuilt.
    pub dataset: bool,
    /// The coloring measurement changed.
    pub measurement: bool,
    /// The filter clause changed.
    pub filter: bool,
    /// The trajectory selection changed.
    pub trajectories: bool,
}

impl PlotUpdates {
    /// Whether anything needs redrawing.
    pub fn any(&self) -> bool {
        self.dataset || self.measurement || self.filter || self.trajectories
    }

    /// Whether node attributes have to be fetched again.
    fn needs_attributes(&self) -> bool {
        self.measurement || self.filter
    }
}

fn bind_coloring(
    measurement: Option<&MeasurementChoice>,
    graph: &LineageGraph,
    derived: &DerivedMeasurements,
) -> Option<ColoringChannel> {
    measurement.map(|choice| match choice {
        MeasurementChoice::Dataset(name) => ColoringChannel::from_dataset(name.as_str(), graph),
        MeasurementChoice::Derived(kind) => ColoringChannel::from_derived(*kind, derived),
    })
}

#[derive(Debug, Clone)]
struct DatasetState {
    graph: LineageGraph,
    report: BuildReport,
    components: ComponentIndex,
    layout: LineageLayout,
    derived: DerivedMeasurements,
    selection: TrajectorySelectionManager,
    coloring: Option<ColoringChannel>,
}

/// Cached lineage pipeline for one dataset at a time.
#[derive(Debug)]
pub struct LineageSession {
    builder: LineageGraphBuilder,
    layout_engine: LayeredLayoutEngine,
    measurement_engine: DerivedMeasurementEngine,
    diagnostics: TrackingDiagnostics,

    dataset: Option<DatasetSelector>,
    measurement: Option<MeasurementChoice>,
    filter: Option<String>,
    updates: PlotUpdates,
    state: Option<DatasetState>,
}

impl LineageSession {
    /// Create an empty session.
    ///
    /// # Arguments
    /// * `config` - Layout, measurement and diagnostics settings, validated here
    pub fn new(config: LineageConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            builder: LineageGraphBuilder::new(),
            layout_engine: LayeredLayoutEngine::new(config.layout)?,
            measurement_engine: DerivedMeasurementEngine::new(config.measurements)?,
            diagnostics: TrackingDiagnostics::new(config.diagnostics)?,
            dataset: None,
            measurement: None,
            filter: None,
            updates: PlotUpdates::default(),
            state: None,
        })
    }

    // ===== Inputs =====

    /// Select the dataset. Selecting the current dataset again is a no-op.
    pub fn set_dataset(&mut self, dataset: DatasetSelector) {
        if self.dataset.as_ref() != Some(&dataset) {
            self.dataset = Some(dataset);
            self.updates.dataset = true;
        }
    }

    /// Select the coloring measurement.
    pub fn set_measurement(&mut self, measurement: Option<MeasurementChoice>) {
        if self.measurement != measurement {
            self.measurement = measurement;
            self.updates.measurement = true;
        }
    }

    /// Set the filter clause passed to the data source.
    pub fn set_filter(&mut self, filter: Option<String>) {
        if self.filter != filter {
            self.filter = filter;
            self.updates.filter = true;
        }
    }

    /// Include exactly the given trajectories.
    pub fn set_selection<I: IntoIterator<Item = TrajectoryId>>(&mut self, ids: I) -> Result<()> {
        let state = self.state_mut()?;
        state.selection.set_selection(ids)?;
        self.updates.trajectories = true;
        Ok(())
    }

    /// Include or exclude every trajectory.
    pub fn toggle_all(&mut self, include: bool) -> Result<()> {
        self.state_mut()?.selection.toggle_all(include);
        self.updates.trajectories = true;
        Ok(())
    }

    /// Pending changes since the last refresh.
    pub fn updates(&self) -> PlotUpdates {
        self.updates
    }

    // ===== Refresh =====

    /// Bring the cached state up to date with the inputs.
    ///
    /// # Returns
    /// The changes that were applied. Flags are cleared afterwards.
    pub fn refresh(&mut self, source: &dyn TrackingDataSource) -> Result<PlotUpdates> {
        let dataset = self
            .dataset
            .clone()
            .ok_or_else(|| Error::EmptyGraph("no dataset selected".to_string()))?;
        let mut applied = self.updates;

        if self.updates.dataset || self.state.is_none() {
            // No state survives a failed rebuild.
            self.state = None;
            self.state = Some(self.rebuild(source, &dataset)?);
            applied.dataset = true;
        } else if self.updates.needs_attributes() {
            self.rebind(source, &dataset)?;
        }

        self.updates = PlotUpdates::default();
        Ok(applied)
    }

    fn fetch_records(&self, source: &dyn TrackingDataSource, dataset: &DatasetSelector) -> Result<TrackingRecordSet> {
        let column = self.measurement.as_ref().and_then(MeasurementChoice::dataset_column);
        source.fetch_tracking_rows(dataset, column, self.filter.as_deref())
    }

    fn rebuild(&self, source: &dyn TrackingDataSource, dataset: &DatasetSelector) -> Result<DatasetState> {
        let started = Instant::now();
        let records = self.fetch_records(source, dataset)?;
        info!("Retrieved {} objects from dataset {}", records.len(), dataset);

        let (graph, report) = self.builder.build(&records)?;
        let components = ComponentIndex::new(&graph);
        let layout = self.layout_engine.compute(&graph);
        let derived = self.measurement_engine.compute(&graph, &components)?;
        let selection = TrajectorySelectionManager::new(&components);
        let coloring = bind_coloring(self.measurement.as_ref(), &graph, &derived);

        debug!(
            "Rebuilt dataset {} with {} trajectories ({:.2} sec)",
            dataset,
            components.len(),
            started.elapsed().as_secs_f64()
        );

        Ok(DatasetState {
            graph,
            report,
            components,
            layout,
            derived,
            selection,
            coloring,
        })
    }

    fn rebind(&mut self, source: &dyn TrackingDataSource, dataset: &DatasetSelector) -> Result<()> {
        let needs_fetch = self.updates.filter || matches!(self.measurement, Some(MeasurementChoice::Dataset(_)));
        let records = if needs_fetch {
            Some(self.fetch_records(source, dataset)?)
        } else {
            None
        };

        let state = self
            .state
            .as_mut()
            .ok_or_else(|| Error::EmptyGraph("session has not been refreshed".to_string()))?;
        if let Some(records) = &records {
            let updated = state.graph.update_from_records(records);
            debug!("Updated attributes of {} nodes", updated);
        }
        state.coloring = bind_coloring(self.measurement.as_ref(), &state.graph, &state.derived);
        Ok(())
    }

    fn state(&self) -> Result<&DatasetState> {
        self.state
            .as_ref()
            .ok_or_else(|| Error::EmptyGraph("session has not been refreshed".to_string()))
    }

    fn state_mut(&mut self) -> Result<&mut DatasetState> {
        self.state
            .as_mut()
            .ok_or_else(|| Error::EmptyGraph("session has not been refreshed".to_string()))
    }

    // ===== Outputs =====

    /// Currently selected dataset.
    pub fn dataset(&self) -> Option<&DatasetSelector> {
        self.dataset.as_ref()
    }

    /// Currently selected measurement.
    pub fn measurement(&self) -> Option<&MeasurementChoice> {
        self.measurement.as_ref()
    }

    /// Canonical lineage graph.
    pub fn graph(&self) -> Result<&LineageGraph> {
        Ok(&self.state()?.graph)
    }

    /// Issues recovered while building the graph.
    pub fn build_report(&self) -> Result<&BuildReport> {
        Ok(&self.state()?.report)
    }

    /// Trajectories of the graph.
    pub fn components(&self) -> Result<&ComponentIndex> {
        Ok(&self.state()?.components)
    }

    /// Layout coordinates.
    pub fn layout(&self) -> Result<&LineageLayout> {
        Ok(&self.state()?.layout)
    }

    /// Derived measurement arrays.
    pub fn derived(&self) -> Result<&DerivedMeasurements> {
        Ok(&self.state()?.derived)
    }

    /// Trajectory selection.
    pub fn selection(&self) -> Result<&TrajectorySelectionManager> {
        Ok(&self.state()?.selection)
    }

    /// Active coloring channel, `None` when no measurement is selected.
    pub fn coloring(&self) -> Result<Option<&ColoringChannel>> {
        Ok(self.state()?.coloring.as_ref())
    }

    /// Display copy of the graph without excluded trajectories.
    pub fn pruned_subgraph(&self) -> Result<PrunedGraph> {
        let state = self.state()?;
        Ok(state.selection.pruned_subgraph(&state.graph, &state.components))
    }

    /// Linking diagnostics of the selected dataset.
    pub fn diagnostics(&self, source: &dyn TrackingDataSource) -> Result<DiagnosticsReport> {
        let dataset = self
            .dataset
            .as_ref()
            .ok_or_else(|| Error::EmptyGraph("no dataset selected".to_string()))?;
        let predictions = source.fetch_prediction_rows(dataset)?;
        let relationships = source.fetch_relationship_rows(dataset)?;
        self.diagnostics.report(&predictions, &relationships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ObjectKey, TrackingRecord};

    /// Serves records for dataset "1" only; every other dataset is empty.
    struct SingleDatasetSource;

    impl TrackingDataSource for SingleDatasetSource {
        fn fetch_tracking_rows(
            &self,
            dataset: &DatasetSelector,
            _measurement: Option<&str>,
            _filter: Option<&str>,
        ) -> Result<TrackingRecordSet> {
            if dataset.parts() != ["1"] {
                return Ok(TrackingRecordSet::default());
            }
            Ok(vec![TrackingRecord::new(ObjectKey::new(1, 1), ObjectKey::NULL, 1, 0.0, 0.0, 0)]
                .into_iter()
                .collect())
        }

        fn fetch_relationship_rows(&self, _dataset: &DatasetSelector) -> Result<Vec<RelationshipRow>> {
            Ok(Vec::new())
        }

        fn fetch_prediction_rows(&self, _dataset: &DatasetSelector) -> Result<Vec<PredictionRow>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_accessors_fail_before_refresh() {
        let session = LineageSession::new(LineageConfig::default()).unwrap();
        assert!(matches!(session.graph(), Err(Error::EmptyGraph(_))));
        assert!(matches!(session.pruned_subgraph(), Err(Error::EmptyGraph(_))));
    }

    #[test]
    fn test_failed_rebuild_drops_previous_dataset() {
        let source = SingleDatasetSource;
        let mut session = LineageSession::new(LineageConfig::default()).unwrap();

        session.set_dataset(DatasetSelector::parse("1"));
        session.refresh(&source).unwrap();
        assert_eq!(session.graph().unwrap().node_count(), 1);

        session.set_dataset(DatasetSelector::parse("2"));
        assert!(matches!(session.refresh(&source), Err(Error::EmptyGraph(_))));

        assert_eq!(session.dataset().map(|d| d.to_string()), Some("2".to_string()));
        assert!(matches!(session.graph(), Err(Error::EmptyGraph(_))));
        assert!(matches!(session.layout(), Err(Error::EmptyGraph(_))));
        assert!(matches!(session.components(), Err(Error::EmptyGraph(_))));
        assert!(matches!(session.pruned_subgraph(), Err(Error::EmptyGraph(_))));
        assert!(matches!(session.set_selection([1]), Err(Error::EmptyGraph(_))));
        assert!(matches!(session.toggle_all(true), Err(Error::EmptyGraph(_))));

        // Switching back rebuilds from scratch.
        session.set_dataset(DatasetSelector::parse("1"));
        session.refresh(&source).unwrap();
        assert_eq!(session.graph().unwrap().node_count(), 1);
    }
}
