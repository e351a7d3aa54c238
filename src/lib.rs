//! # lineage-rs - Cell Lineage Analysis Library
//!
//! Builds lineage graphs from the per-object output of a frame-to-frame cell
//! tracker and derives what is needed to inspect them.
//!
//! ## Features
//!
//! - Lineage graph construction with recovered, reported record issues
//! - Trajectory (connected component) indexing
//! - Deterministic layered layout with crossing reduction
//! - Topology-derived quality-control measurements
//! - Trajectory selection and pruned display graphs
//! - Linking-distance and gap-length diagnostics for LAP tracking
//!
//! ## Example
//!
//! ```rust,ignore
//! use lineage_rs::{
//!     ComponentIndex, LayeredLayoutEngine, LineageGraphBuilder, ObjectKey, TrackingRecord,
//!     TrackingRecordSet,
//! };
//!
//! let records: TrackingRecordSet = vec![
//!     TrackingRecord::new(ObjectKey::new(1, 1), ObjectKey::NULL, 1, 10.0, 10.0, 0),
//!     TrackingRecord::new(ObjectKey::new(2, 1), ObjectKey::new(1, 1), 1, 11.0, 10.0, 1),
//! ]
//! .into_iter()
//! .collect();
//!
//! let (graph, report) = LineageGraphBuilder::new().build(&records)?;
//! let components = ComponentIndex::new(&graph);
//! let layout = LayeredLayoutEngine::default().compute(&graph);
//! ```

// Public modules
pub mod components;
pub mod config;
pub mod diagnostics;
pub mod graph;
pub mod layout;
pub mod measurements;
pub mod record;
pub mod selection;
pub mod session;

// Re-exports for convenience
pub use components::{ComponentIndex, Trajectory, TrajectoryId};
pub use config::{DiagnosticsConfig, LayoutConfig, LineageConfig, MeasurementConfig};
pub use diagnostics::{
    DiagnosticsReport, GapSummary, Histogram, LinkingDistances, PredictionRow, RelationshipRow, TrackingDiagnostics,
};
pub use graph::{BuildReport, DenseIndex, LineageGraph, LineageGraphBuilder, RecordIssue, RecordIssueKind, TrackedNode};
pub use layout::{LayeredLayoutEngine, LineageLayout};
pub use measurements::{ColoringChannel, DerivedMeasurementEngine, DerivedMeasurementKind, DerivedMeasurements};
pub use record::{DatasetSelector, ObjectKey, TrackingRecord, TrackingRecordSet};
pub use selection::{PrunedGraph, TrajectorySelectionManager};
pub use session::{LineageSession, MeasurementChoice, PlotUpdates, TrackingDataSource};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    use crate::components::TrajectoryId;
    use crate::record::ObjectKey;

    fn fmt_key(key: &Option<ObjectKey>) -> String {
        match key {
            Some(key) => format!(" {}", key),
            None => String::new(),
        }
    }

    /// Errors that can occur in the lineage library
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Malformed tracking record{}: {reason}", fmt_key(.key))]
        MalformedRecord { key: Option<ObjectKey>, reason: String },

        #[error("Empty graph: {0}")]
        EmptyGraph(String),

        #[error("No valid linking distances found")]
        NoLinkingData,

        #[error("No valid gap lengths found")]
        NoGapData,

        #[error("Unknown measurement: {0}")]
        UnknownMeasurement(String),

        #[error("Unknown trajectory: {0}")]
        UnknownTrajectory(TrajectoryId),

        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Configuration parse error: {0}")]
        ConfigParse(#[from] serde_json::Error),
    }

    /// Result type for lineage operations
    pub type Result<T> = std::result::Result<T, Error>;
}
