//! Construction of the lineage graph from tracking records.

use std::collections::HashMap;
use std::fmt;

use log::{debug, info, warn};

use super::{LineageGraph, TrackedNode};
use crate::record::{ObjectKey, TrackingRecordSet};
use crate::{Error, Result};

/// What was wrong with a record that the builder recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordIssueKind {
    /// The parent key does not resolve to any record. The link is dropped.
    DanglingParent {
        /// The unresolved parent key.
        parent: ObjectKey,
    },
    /// The record names itself as parent. The link is dropped.
    SelfLink,
    /// The parent is not strictly earlier in time. The link is dropped.
    BackwardLink {
        /// Parent key.
        parent: ObjectKey,
        /// Parent timepoint.
        parent_t: i64,
        /// Child timepoint.
        child_t: i64,
    },
    /// A second record with the same key but different attributes or parent.
    /// The later record is dropped.
    ConflictingDuplicate,
    /// A second, identical record for the same key. Ignored.
    IdenticalDuplicate,
}

impl RecordIssueKind {
    /// Whether this issue causes a tracking link to be dropped.
    pub fn drops_edge(&self) -> bool {
        matches!(
            self,
            RecordIssueKind::DanglingParent { .. }
                | RecordIssueKind::SelfLink
                | RecordIssueKind::BackwardLink { .. }
        )
    }
}

/// A recovered problem with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordIssue {
    /// Key of the offending record.
    pub key: ObjectKey,
    /// What was wrong.
    pub kind: RecordIssueKind,
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RecordIssueKind::DanglingParent { parent } => {
                write!(f, "{}: parent {} does not exist", self.key, parent)
            }
            RecordIssueKind::SelfLink => write!(f, "{}: linked to itself", self.key),
            RecordIssueKind::BackwardLink { parent, parent_t, child_t } => write!(
                f,
                "{}: parent {} at t={} is not before t={}",
                self.key, parent, parent_t, child_t
            ),
            RecordIssueKind::ConflictingDuplicate => {
                write!(f, "{}: duplicate record with conflicting attributes", self.key)
            }
            RecordIssueKind::IdenticalDuplicate => write!(f, "{}: identical duplicate record", self.key),
        }
    }
}

/// Summary of one graph build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// Number of input records.
    pub records: usize,
    /// Number of nodes created.
    pub nodes: usize,
    /// Number of edges created.
    pub edges: usize,
    /// Recovered record issues in input order.
    pub issues: Vec<RecordIssue>,
}

impl BuildReport {
    /// Number of tracking links that were dropped.
    pub fn dropped_edges(&self) -> usize {
        self.issues.iter().filter(|i| i.kind.drops_edge()).count()
    }

    /// Number of records that were dropped for conflicting with an earlier one.
    pub fn dropped_records(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.kind == RecordIssueKind::ConflictingDuplicate)
            .count()
    }

    /// Whether the build was clean.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Builds a [`LineageGraph`] from a record set.
///
/// One node is created per distinct key and one edge per resolvable
/// parent link. Links that would break the forward-in-time ordering are
/// dropped and reported, so the result is always acyclic.
#[derive(Debug, Clone, Default)]
pub struct LineageGraphBuilder;

impl LineageGraphBuilder {
    /// Create a builder.
    pub fn new() -> Self {
        Self
    }

    /// Build the graph.
    ///
    /// # Returns
    /// The graph and a report of recovered issues, or
    /// [`Error::EmptyGraph`] when the record set is empty.
    pub fn build(&self, records: &TrackingRecordSet) -> Result<(LineageGraph, BuildReport)> {
        if records.is_empty() {
            return Err(Error::EmptyGraph("no tracking records to build a graph from".to_string()));
        }

        let mut graph = LineageGraph::new();
        let mut report = BuildReport {
            records: records.len(),
            ..BuildReport::default()
        };

        // Parent link of the accepted record for each key, resolved once all
        // nodes exist.
        let mut parents: HashMap<ObjectKey, ObjectKey> = HashMap::with_capacity(records.len());
        let mut links: Vec<(ObjectKey, ObjectKey)> = Vec::with_capacity(records.parent_link_count());

        for record in records {
            let node = TrackedNode::from_record(record);
            if let Some(existing) = graph.node(&record.key) {
                let same_parent = parents.get(&record.key) == Some(&record.parent);
                let kind = if same_parent && existing.same_observation(&node) {
                    RecordIssueKind::IdenticalDuplicate
                } else {
                    RecordIssueKind::ConflictingDuplicate
                };
                report.issues.push(RecordIssue { key: record.key, kind });
                continue;
            }

            graph.insert_node(node);
            parents.insert(record.key, record.parent);
            if !record.parent.is_null() {
                links.push((record.parent, record.key));
            }
        }

        for (parent, child) in links {
            if parent == child {
                report.issues.push(RecordIssue { key: child, kind: RecordIssueKind::SelfLink });
                continue;
            }
            let (Some(parent_idx), Some(child_idx)) = (graph.node_index(&parent), graph.node_index(&child)) else {
                report.issues.push(RecordIssue {
                    key: child,
                    kind: RecordIssueKind::DanglingParent { parent },
                });
                continue;
            };
            let parent_t = graph.inner()[parent_idx].t;
            let child_t = graph.inner()[child_idx].t;
            if parent_t >= child_t {
                report.issues.push(RecordIssue {
                    key: child,
                    kind: RecordIssueKind::BackwardLink { parent, parent_t, child_t },
                });
                continue;
            }
            graph.insert_edge(parent_idx, child_idx);
        }

        report.nodes = graph.node_count();
        report.edges = graph.edge_count();

        if !report.is_clean() {
            warn!(
                "Recovered from {} malformed tracking records ({} links dropped, {} records dropped)",
                report.issues.len(),
                report.dropped_edges(),
                report.dropped_records()
            );
            for issue in report.issues.iter().take(10) {
                debug!("Malformed tracking record {}", issue);
            }
        }
        info!(
            "Constructed graph consisting of {} nodes and {} edges",
            report.nodes, report.edges
        );

        Ok((graph, report))
    }
}
