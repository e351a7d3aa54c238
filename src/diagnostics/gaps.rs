//! Gap lengths of frame-to-frame links.

use serde::Serialize;

use super::histogram::Histogram;
use crate::record::ObjectKey;
use crate::{Error, Result};

/// One parent/child relationship between objects in different frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipRow {
    /// Object in the earlier frame.
    pub parent: ObjectKey,
    /// Object linked to it in a later frame.
    pub child: ObjectKey,
    /// Timepoint of the parent's image.
    pub parent_timepoint: i64,
    /// Timepoint of the child's image.
    pub child_timepoint: i64,
}

impl RelationshipRow {
    /// Relationship between `parent` and `child` at the given timepoints.
    pub fn new(parent: ObjectKey, child: ObjectKey, parent_timepoint: i64, child_timepoint: i64) -> Self {
        Self {
            parent,
            child,
            parent_timepoint,
            child_timepoint,
        }
    }

    /// Number of frames spanned by the link.
    ///
    /// `None` for relationships within one image.
    pub fn gap_length(&self) -> Option<u64> {
        if self.parent.image == self.child.image {
            return None;
        }
        Some(self.child_timepoint.abs_diff(self.parent_timepoint))
    }
}

/// Gap-length statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GapSummary {
    /// Every link joins consecutive frames.
    NoGaps { links: usize },
    /// At least one link was gap-closed.
    Gaps { lengths: Vec<u64>, histogram: Histogram },
}

impl GapSummary {
    /// Compute from relationship rows, with at most `max_bins` histogram bins.
    ///
    /// Fails with [`Error::NoGapData`] when no cross-frame row is present.
    pub fn compute(rows: &[RelationshipRow], max_bins: usize) -> Result<Self> {
        let lengths: Vec<u64> = rows.iter().filter_map(RelationshipRow::gap_length).collect();
        let max = lengths.iter().copied().max().ok_or(Error::NoGapData)?;

        if max <= 1 {
            return Ok(GapSummary::NoGaps { links: lengths.len() });
        }
        let histogram = Histogram::from_integers(&lengths, 1, max_bins);
        Ok(GapSummary::Gaps { lengths, histogram })
    }

    /// Whether any link spans more than one frame.
    pub fn has_gaps(&self) -> bool {
        matches!(self, GapSummary::Gaps { .. })
    }

    /// Number of links summarized.
    pub fn links(&self) -> usize {
        match self {
            GapSummary::NoGaps { links } => *links,
            GapSummary::Gaps { lengths, .. } => lengths.len(),
        }
    }
}
