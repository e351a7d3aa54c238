//! Lineage graph model and construction.
//!
//! - `LineageGraph` - tracked objects and their parent-to-child links
//! - `LineageGraphBuilder` - builds the graph from a `TrackingRecordSet`
//! - `DenseIndex` - explicit key <-> dense integer relabeling

mod builder;
mod index;
mod lineage;

pub use builder::{BuildReport, LineageGraphBuilder, RecordIssue, RecordIssueKind};
pub use index::DenseIndex;
pub use lineage::{LineageGraph, TrackedNode};
