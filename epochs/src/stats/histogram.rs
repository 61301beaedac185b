use crate::error::{EpochError, Result};
use crate::stats::{epoch_groups, stat_frame};
use polars::prelude::DataFrame;

/// A 1-D histogram over a fixed value range
///
/// Bins are equal-width over `[min, max]`; samples outside the range (and
/// non-finite samples) are ignored, and the final bin is closed on the
/// right so `max` itself is counted.
#[derive(Clone, Debug)]
pub struct Histogram {
    /// Left edge of each bin
    pub edges: Vec<f64>,
    /// Samples landing in each bin
    pub counts: Vec<u32>,
}

impl Histogram {
    /// Bin `data` into `bins` equal-width bins over `[min, max]`
    ///
    /// # Errors
    /// Will return `Err` if `bins` is zero or `min >= max`
    pub fn compute(data: &[f64], min: f64, max: f64, bins: usize) -> Result<Self> {
        if bins == 0 {
            return Err(EpochError::InvalidBins);
        }
        if !(min < max) {
            return Err(EpochError::EmptyRange { min, max });
        }

        let width = (max - min) / bins as f64;
        let mut counts = vec![0u32; bins];
        for &v in data {
            if !v.is_finite() || v < min || v > max {
                continue;
            }
            let index = (((v - min) / width) as usize).min(bins - 1);
            counts[index] += 1;
        }

        let edges = (0..bins).map(|i| min + i as f64 * width).collect();
        Ok(Self { edges, counts })
    }

    /// Total samples that landed in a bin
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }
}

/// Per-epoch histograms of one channel of an epoched table
///
/// Returns a long table `[sweep, epoch, bin, count]` where `bin` is the
/// left edge of each bin, one row per bin per epoch, groups ordered the
/// same way the epoched table is.
///
/// # Errors
/// Will return `Err` if the channel is missing, `bins` is zero, or `min >= max`
pub fn epoch_histogram(
    epoch_df: &DataFrame,
    channel: &str,
    min: f64,
    max: f64,
    bins: usize,
) -> Result<DataFrame> {
    let mut rows = Vec::new();
    for (sweep, epoch, values) in epoch_groups(epoch_df, channel)? {
        let histogram = Histogram::compute(&values, min, max, bins)?;
        let counts = histogram.counts.iter().map(|&c| f64::from(c)).collect();
        rows.push((sweep, epoch, histogram.edges, counts));
    }
    stat_frame(rows, "bin", "count")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_histogram_counts_and_edges() {
        let data = vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.9, 4.0];
        let histogram = Histogram::compute(&data, 0.0, 4.0, 4).unwrap();
        assert_eq!(histogram.edges, vec![0.0, 1.0, 2.0, 3.0]);
        // 4.0 lands in the last (right-closed) bin
        assert_eq!(histogram.counts, vec![2, 2, 2, 2]);
        assert_eq!(histogram.total(), 8);
    }

    #[test]
    fn test_histogram_ignores_out_of_range_and_nan() {
        let data = vec![-1.0, 0.5, f64::NAN, 9.0, f64::INFINITY];
        let histogram = Histogram::compute(&data, 0.0, 1.0, 2).unwrap();
        assert_eq!(histogram.total(), 1);
    }

    #[test]
    fn test_histogram_rejects_bad_ranges() {
        assert!(matches!(
            Histogram::compute(&[1.0], 0.0, 1.0, 0),
            Err(EpochError::InvalidBins)
        ));
        assert!(matches!(
            Histogram::compute(&[1.0], 2.0, 2.0, 4),
            Err(EpochError::EmptyRange { .. })
        ));
    }

    #[test]
    fn test_histogram_bin_width() {
        let histogram = Histogram::compute(&[0.25], 0.0, 1.0, 10).unwrap();
        assert_relative_eq!(histogram.edges[1] - histogram.edges[0], 0.1);
        assert_eq!(histogram.counts[2], 1);
    }
}
