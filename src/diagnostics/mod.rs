//! Linking diagnostics for LAP tracking output.
//!
//! Two independent statistics over rows supplied by the storage layer:
//! - linking distances between Kalman predictions and observed positions
//! - gap lengths of links, in frames

mod gaps;
mod histogram;
mod linking;

pub use gaps::{GapSummary, RelationshipRow};
pub use histogram::Histogram;
pub use linking::{LinkingDistances, PredictionRow, PREDICTION_COLUMN_COUNT};

use log::{debug, info};
use serde::Serialize;

use crate::config::DiagnosticsConfig;
use crate::{Error, Result};

/// Both diagnostics. A statistic without usable rows is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiagnosticsReport {
    /// Linking distances, `None` without usable prediction rows.
    pub linking: Option<LinkingDistances>,
    /// Gap lengths, `None` without cross-frame relationships.
    pub gaps: Option<GapSummary>,
}

impl DiagnosticsReport {
    /// Suggested upper bound for the tracker's linking search radius.
    pub fn search_radius_threshold(&self) -> Option<f64> {
        self.linking.as_ref().and_then(|l| l.search_radius_threshold)
    }
}

/// Computes linking diagnostics.
#[derive(Debug, Clone, Default)]
pub struct TrackingDiagnostics {
    config: DiagnosticsConfig,
}

impl TrackingDiagnostics {
    /// Create the diagnostics, validating the configuration.
    pub fn new(config: DiagnosticsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Linking distances with histogram and search-radius threshold.
    pub fn linking_distances(&self, rows: &[PredictionRow]) -> Result<LinkingDistances> {
        let result = LinkingDistances::compute(rows, &self.config)?;
        debug!(
            "Linking distances: {} of {} rows usable, threshold {:?}",
            result.len(),
            rows.len(),
            result.search_radius_threshold
        );
        Ok(result)
    }

    /// Gap-length summary.
    pub fn gap_lengths(&self, rows: &[RelationshipRow]) -> Result<GapSummary> {
        GapSummary::compute(rows, self.config.max_bins)
    }

    /// Compute both statistics.
    ///
    /// Missing data is reported as `None` in the report.
    pub fn report(&self, predictions: &[PredictionRow], relationships: &[RelationshipRow]) -> Result<DiagnosticsReport> {
        let linking = match self.linking_distances(predictions) {
            Ok(result) => Some(result),
            Err(Error::NoLinkingData) => {
                info!("No valid linking distances found");
                None
            }
            Err(e) => return Err(e),
        };
        let gaps = match self.gap_lengths(relationships) {
            Ok(GapSummary::NoGaps { links }) => {
                info!("No gap lengths > 1 found in {} links", links);
                Some(GapSummary::NoGaps { links })
            }
            Ok(summary) => Some(summary),
            Err(Error::NoGapData) => {
                info!("No valid gap lengths found");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(DiagnosticsReport { linking, gaps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ObjectKey;
    use nalgebra::Point2;

    #[test]
    fn test_invalid_config() {
        let config = DiagnosticsConfig {
            distance_bin_width: 0.0,
            ..Default::default()
        };
        assert!(matches!(TrackingDiagnostics::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_report_without_data() {
        let report = TrackingDiagnostics::default().report(&[], &[]).unwrap();
        assert_eq!(report, DiagnosticsReport::default());
        assert_eq!(report.search_radius_threshold(), None);
    }

    #[test]
    fn test_report() {
        let predictions = vec![
            PredictionRow::new(None, Some(Point2::new(0.0, 0.0)), Point2::new(3.0, 4.0)),
            PredictionRow::new(Some(Point2::new(1.0, 1.0)), None, Point2::new(1.0, 1.5)),
        ];
        let relationships = vec![RelationshipRow::new(ObjectKey::new(1, 1), ObjectKey::new(2, 1), 1, 2)];

        let report = TrackingDiagnostics::default().report(&predictions, &relationships).unwrap();
        let linking = report.linking.as_ref().unwrap();
        assert_eq!(linking.distances, vec![5.0, 0.5]);
        assert_eq!(report.gaps, Some(GapSummary::NoGaps { links: 1 }));
        assert_eq!(report.search_radius_threshold(), Some(1.0));
    }
}
