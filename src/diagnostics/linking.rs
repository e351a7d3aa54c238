//! Frame-to-frame linking distances.
//!
//! For each link the tracker stored the position it predicted for the next
//! frame under a constant-velocity model, a zero-velocity model, or both.
//! The linking distance is the error between that prediction and the
//! observed position, taking the better model per link.

use nalgebra::{distance, Point2};
use serde::Serialize;

use super::histogram::Histogram;
use crate::config::DiagnosticsConfig;
use crate::{Error, Result};

/// Number of columns in a raw prediction row.
pub const PREDICTION_COLUMN_COUNT: usize = 6;

/// Predicted and observed position for one frame-to-frame link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRow {
    /// Constant-velocity prediction (state position + state velocity).
    pub velocity: Option<Point2<f64>>,
    /// Zero-velocity prediction (state position).
    pub no_velocity: Option<Point2<f64>>,
    /// Observed position of the linked object in the next frame.
    pub observed: Point2<f64>,
}

fn point(x: Option<f64>, y: Option<f64>) -> Option<Point2<f64>> {
    match (x, y) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some(Point2::new(x, y)),
        _ => None,
    }
}

impl PredictionRow {
    /// Row with explicit predictions.
    pub fn new(velocity: Option<Point2<f64>>, no_velocity: Option<Point2<f64>>, observed: Point2<f64>) -> Self {
        Self {
            velocity,
            no_velocity,
            observed,
        }
    }

    /// Constant-velocity prediction from a Kalman state `(x, vx, y, vy)`.
    pub fn velocity_from_state(x: f64, vx: f64, y: f64, vy: f64) -> Point2<f64> {
        Point2::new(x + vx, y + vy)
    }

    /// Parse a numeric storage row.
    ///
    /// Column order: velocity-model x, y, zero-velocity-model x, y,
    /// observed x, y. A model whose columns are missing is treated as not
    /// used for that link.
    pub fn from_raw(row: &[Option<f64>]) -> Result<Self> {
        if row.len() != PREDICTION_COLUMN_COUNT {
            return Err(Error::MalformedRecord {
                key: None,
                reason: format!(
                    "expected {} prediction columns, got {}",
                    PREDICTION_COLUMN_COUNT,
                    row.len()
                ),
            });
        }
        let observed = point(row[4], row[5]).ok_or_else(|| Error::MalformedRecord {
            key: None,
            reason: "observed position is missing".to_string(),
        })?;
        Ok(Self {
            velocity: point(row[0], row[1]),
            no_velocity: point(row[2], row[3]),
            observed,
        })
    }

    /// Prediction error, minimum over the models present.
    ///
    /// `None` when no model is present or the observation is not finite.
    pub fn linking_distance(&self) -> Option<f64> {
        if !(self.observed.x.is_finite() && self.observed.y.is_finite()) {
            return None;
        }
        [self.velocity, self.no_velocity]
            .into_iter()
            .flatten()
            .map(|p| distance(&p, &self.observed))
            .filter(|d| d.is_finite())
            .reduce(f64::min)
    }
}

/// Linking distances and their histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkingDistances {
    /// Per-link distance, in row order, unusable rows skipped.
    pub distances: Vec<f64>,
    /// Histogram of the distances from 0.
    pub histogram: Histogram,
    /// Distance at which the histogram has decayed below the peak fraction.
    pub search_radius_threshold: Option<f64>,
}

impl LinkingDistances {
    /// Compute from prediction rows.
    ///
    /// # Arguments
    /// * `rows` - Prediction rows; rows without a usable model are skipped
    /// * `config` - Bin width, peak fraction and bin cap of the histogram
    ///
    /// Fails with [`Error::NoLinkingData`] when no row is usable.
    pub fn compute(rows: &[PredictionRow], config: &DiagnosticsConfig) -> Result<Self> {
        let distances: Vec<f64> = rows.iter().filter_map(PredictionRow::linking_distance).collect();
        if distances.is_empty() {
            return Err(Error::NoLinkingData);
        }

        let histogram = Histogram::from_values(&distances, 0.0, config.distance_bin_width, config.max_bins);
        let search_radius_threshold = histogram
            .first_bin_below(config.peak_fraction)
            .map(|bin| histogram.bin_left(bin));

        Ok(Self {
            distances,
            histogram,
            search_radius_threshold,
        })
    }

    /// Number of usable links.
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Whether there are no distances. Never true for a computed result.
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }
}
