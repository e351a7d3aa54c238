//! Configuration for layout, derived measurements and diagnostics.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for the layered lineage layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of alternating barycenter sweeps used to reduce edge crossings.
    pub ordering_sweeps: usize,

    /// Number of median refinement passes over the separation axis.
    pub refinement_passes: usize,

    /// Minimum separation between neighbouring nodes in one layer, before
    /// aspect normalization.
    pub min_separation: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            ordering_sweeps: 8,
            refinement_passes: 4,
            min_separation: 1.0,
        }
    }
}

impl LayoutConfig {
    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_separation.is_finite() && self.min_separation > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "min_separation must be positive, got {}",
                self.min_separation
            )));
        }
        Ok(())
    }
}

/// Configuration for topology-derived measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    /// Hop cutoff from a branch point when looking for short-lived leaves.
    pub branch_cutoff: usize,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self { branch_cutoff: 4 }
    }
}

impl MeasurementConfig {
    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.branch_cutoff == 0 {
            return Err(Error::InvalidConfig("branch_cutoff must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Configuration for linking diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Bin width of the linking-distance histogram, in pixels.
    pub distance_bin_width: f64,

    /// Fraction of the peak count below which a bin counts as "decayed".
    pub peak_fraction: f64,

    /// Upper bound on the number of histogram bins. Larger values are
    /// counted in the last bin.
    pub max_bins: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            distance_bin_width: 1.0,
            peak_fraction: 0.05,
            max_bins: 10_000,
        }
    }
}

impl DiagnosticsConfig {
    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.distance_bin_width.is_finite() && self.distance_bin_width > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "distance_bin_width must be positive, got {}",
                self.distance_bin_width
            )));
        }
        if !(self.peak_fraction > 0.0 && self.peak_fraction < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "peak_fraction must be in (0, 1), got {}",
                self.peak_fraction
            )));
        }
        if self.max_bins == 0 {
            return Err(Error::InvalidConfig("max_bins must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageConfig {
    /// Layout settings.
    pub layout: LayoutConfig,
    /// Derived measurement settings.
    pub measurements: MeasurementConfig,
    /// Diagnostics settings.
    pub diagnostics: DiagnosticsConfig,
}

impl LineageConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        self.measurements.validate()?;
        self.diagnostics.validate()
    }
}
