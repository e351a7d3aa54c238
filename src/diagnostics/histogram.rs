//! Fixed-width histograms.

use serde::Serialize;

/// Histogram with equal-width bins starting at `origin`.
///
/// Bin `i` covers `[origin + i * width, origin + (i + 1) * width)`, except
/// the last bin, which also includes its right edge. When the bin count is
/// capped, the last bin also holds every larger value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    origin: f64,
    bin_width: f64,
    counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` from `origin` up to their maximum.
    ///
    /// Values below `origin` and non-finite values are ignored. At least one
    /// and at most `max_bins` bins are produced; values beyond the last bin
    /// are counted in it.
    pub fn from_values(values: &[f64], origin: f64, bin_width: f64, max_bins: usize) -> Self {
        let max_bins = max_bins.max(1);
        let max = values
            .iter()
            .copied()
            .filter(|v| v.is_finite() && *v >= origin)
            .fold(origin, f64::max);
        let span_bins = ((max - origin) / bin_width).ceil();
        let num_bins = if span_bins.is_finite() && span_bins < max_bins as f64 {
            (span_bins as usize).max(1)
        } else {
            max_bins
        };

        let mut counts = vec![0; num_bins];
        for &v in values {
            if !v.is_finite() || v < origin {
                continue;
            }
            // Saturating cast, then clamp into the last bin.
            let bin = (((v - origin) / bin_width).floor() as usize).min(num_bins - 1);
            counts[bin] += 1;
        }

        Self { origin, bin_width, counts }
    }

    /// One unit-width bin per integer from `origin` to the maximum value,
    /// at most `max_bins` bins. Values beyond the last bin are counted in it.
    pub fn from_integers(values: &[u64], origin: u64, max_bins: usize) -> Self {
        let max_bins = max_bins.max(1);
        let max = values.iter().copied().filter(|&v| v >= origin).max().unwrap_or(origin);
        let last = (max - origin).min(max_bins as u64 - 1) as usize;
        let mut counts = vec![0; last + 1];
        for &v in values.iter().filter(|&&v| v >= origin) {
            let bin = (v - origin).min(last as u64) as usize;
            counts[bin] += 1;
        }
        Self {
            origin: origin as f64,
            bin_width: 1.0,
            counts,
        }
    }

    /// Counts per bin.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Number of bins.
    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// Width of each bin.
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Left edge of a bin.
    pub fn bin_left(&self, bin: usize) -> f64 {
        self.origin + bin as f64 * self.bin_width
    }

    /// Bin edges, `num_bins + 1` values.
    pub fn edges(&self) -> Vec<f64> {
        (0..=self.counts.len()).map(|i| self.bin_left(i)).collect()
    }

    /// Largest bin count.
    pub fn peak(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Total number of binned values.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// First bin, scanning left to right, whose count is below
    /// `fraction * peak`.
    pub fn first_bin_below(&self, fraction: f64) -> Option<usize> {
        let limit = fraction * self.peak() as f64;
        self.counts.iter().position(|&c| (c as f64) < limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MAX_BINS: usize = 10_000;

    #[test]
    fn test_from_values_bins() {
        let h = Histogram::from_values(&[0.5, 1.5, 1.5, 3.2], 0.0, 1.0, MAX_BINS);
        assert_eq!(h.counts(), &[1, 2, 0, 1]);
        assert_eq!(h.peak(), 2);
        assert_eq!(h.total(), 4);
        assert_eq!(h.edges(), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_last_bin_is_closed() {
        let h = Histogram::from_values(&[0.0, 2.0], 0.0, 1.0, MAX_BINS);
        assert_eq!(h.counts(), &[1, 1]);
    }

    #[test]
    fn test_single_bin_for_small_values() {
        let h = Histogram::from_values(&[0.0, 0.0], 0.0, 1.0, MAX_BINS);
        assert_eq!(h.counts(), &[2]);
        let h = Histogram::from_values(&[f64::NAN, -1.0], 0.0, 1.0, MAX_BINS);
        assert_eq!(h.total(), 0);
    }

    #[test]
    fn test_first_bin_below() {
        let h = Histogram::from_values(&[0.5, 1.5, 1.5, 3.2], 0.0, 1.0, MAX_BINS);
        assert_eq!(h.first_bin_below(0.05), Some(2));
        assert_relative_eq!(h.bin_left(2), 2.0);

        let flat = Histogram::from_values(&[0.5, 1.5], 0.0, 1.0, MAX_BINS);
        assert_eq!(flat.first_bin_below(0.05), None);
    }

    #[test]
    fn test_from_integers() {
        let h = Histogram::from_integers(&[1, 1, 3, 2, 1], 1, MAX_BINS);
        assert_eq!(h.counts(), &[3, 1, 1]);
        assert_relative_eq!(h.bin_left(0), 1.0);
    }

    #[test]
    fn test_from_values_caps_bins() {
        let h = Histogram::from_values(&[0.5, 1.5, 1e19, f64::MAX], 0.0, 1.0, 100);
        assert_eq!(h.num_bins(), 100);
        assert_eq!(h.total(), 4);
        assert_eq!(h.counts()[0], 1);
        assert_eq!(h.counts()[1], 1);
        assert_eq!(h.counts()[99], 2);

        let tiny_width = Histogram::from_values(&[1.0], 0.0, f64::MIN_POSITIVE, 8);
        assert_eq!(tiny_width.num_bins(), 8);
        assert_eq!(tiny_width.counts()[7], 1);
    }

    #[test]
    fn test_from_integers_caps_bins() {
        let h = Histogram::from_integers(&[1, 2, u64::MAX], 1, 50);
        assert_eq!(h.num_bins(), 50);
        assert_eq!(h.counts()[0], 1);
        assert_eq!(h.counts()[1], 1);
        assert_eq!(h.counts()[49], 1);
        assert_eq!(h.total(), 3);
    }
}
