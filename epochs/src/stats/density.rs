use crate::error::{EpochError, Result};
use crate::stats::{epoch_groups, stat_frame};
use polars::prelude::DataFrame;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Kernel bandwidth selection rule
///
/// `Scott` matches the classic automatic rule (`σ · n^(-1/5)`); `Silverman`
/// shrinks toward the IQR for heavy-tailed data
/// (`0.9 · min(σ, IQR/1.34) · n^(-1/5)`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Bandwidth {
    #[default]
    Scott,
    Silverman,
    /// Explicit bandwidth in data units
    Fixed(f64),
}

impl Bandwidth {
    /// Resolve the rule to a concrete bandwidth for `data`
    fn resolve(self, data: &[f64]) -> Result<f64> {
        let bandwidth = match self {
            Self::Fixed(bw) => bw,
            Self::Scott => {
                let n = data.len() as f64;
                standard_deviation(data)? * n.powf(-0.2)
            }
            Self::Silverman => {
                let n = data.len() as f64;
                let std_dev = standard_deviation(data)?;
                let iqr = interquartile_range(data)?;
                0.9 * std_dev.min(iqr / 1.34) * n.powf(-0.2)
            }
        };
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            return Err(EpochError::Stats(format!(
                "Degenerate KDE bandwidth: {bandwidth}"
            )));
        }
        Ok(bandwidth)
    }
}

/// Kernel Density Estimation using a Gaussian kernel
///
/// Evaluated on a caller-supplied grid so per-epoch estimates line up for
/// comparison, unlike data-driven grids that shift from epoch to epoch.
pub struct KernelDensity {
    /// Grid points
    pub x: Vec<f64>,
    /// Density values
    pub y: Vec<f64>,
}

impl KernelDensity {
    /// Compute a kernel density estimate over `[min, max]`
    ///
    /// # Arguments
    /// * `data` - Input samples (non-finite values are dropped)
    /// * `min`, `max` - Evaluation range
    /// * `resolution` - Number of grid points
    /// * `bandwidth` - Bandwidth selection rule
    ///
    /// # Errors
    /// Will return `Err` if fewer than 3 finite samples remain, the range is
    /// empty, or the bandwidth degenerates (e.g. constant data under an
    /// automatic rule)
    pub fn estimate(
        data: &[f64],
        min: f64,
        max: f64,
        resolution: usize,
        bandwidth: Bandwidth,
    ) -> Result<Self> {
        if !(min < max) {
            return Err(EpochError::EmptyRange { min, max });
        }
        if resolution < 2 {
            return Err(EpochError::Stats(
                "KDE resolution must be at least 2".to_string(),
            ));
        }

        let clean_data: Vec<f64> = data.iter().filter(|x| x.is_finite()).copied().collect();
        if clean_data.len() < 3 {
            return Err(EpochError::InsufficientData {
                min: 3,
                actual: clean_data.len(),
            });
        }

        let n = clean_data.len() as f64;
        let bandwidth = bandwidth.resolve(&clean_data)?;

        let x: Vec<f64> = (0..resolution)
            .map(|i| min + (max - min) * (i as f64) / (resolution - 1) as f64)
            .collect();

        let y: Vec<f64> = x
            .iter()
            .map(|&xi| {
                let sum: f64 = clean_data
                    .iter()
                    .map(|&xj| gaussian_kernel((xi - xj) / bandwidth))
                    .sum();
                sum / (n * bandwidth)
            })
            .collect();

        Ok(Self { x, y })
    }

    /// Find local maxima (peaks) in the density estimate
    ///
    /// # Arguments
    /// * `min_height` - Minimum peak height as a fraction of the max density
    ///
    /// # Returns
    /// X-coordinates where peaks occur; falls back to the global maximum when
    /// no interior peak clears the threshold
    #[must_use]
    pub fn find_peaks(&self, min_height: f64) -> Vec<f64> {
        if self.y.len() < 3 {
            return Vec::new();
        }

        let max_y = self.y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let threshold = min_height * max_y;

        let mut peaks = Vec::new();
        for i in 1..self.y.len() - 1 {
            if self.y[i] > self.y[i - 1] && self.y[i] > self.y[i + 1] && self.y[i] > threshold {
                peaks.push(self.x[i]);
            }
        }

        if peaks.is_empty() {
            if let Some((index, _)) = self
                .y
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            {
                peaks.push(self.x[index]);
            }
        }

        peaks
    }
}

/// Default evaluation grid size for a value range: five points per unit
#[must_use]
pub fn default_resolution(min: f64, max: f64) -> usize {
    (((max - min).abs() * 5.0).round() as usize).max(2)
}

/// Per-epoch kernel density estimates of one channel of an epoched table
///
/// Every epoch is evaluated on the same `[min, max]` grid. `resolution`
/// defaults to five points per data unit when `None`.
///
/// Returns a long table `[sweep, epoch, x, density]`.
///
/// # Errors
/// Will return `Err` if the channel is missing, the range is empty, or any
/// epoch has fewer than 3 finite samples
pub fn epoch_density(
    epoch_df: &DataFrame,
    channel: &str,
    min: f64,
    max: f64,
    resolution: Option<usize>,
    bandwidth: Bandwidth,
) -> Result<DataFrame> {
    let resolution = resolution.unwrap_or_else(|| default_resolution(min, max));
    // Each epoch's kernel sum is O(samples × grid points), so the groups are
    // worth estimating in parallel
    let rows = epoch_groups(epoch_df, channel)?
        .into_par_iter()
        .map(|(sweep, epoch, values)| {
            let kde = KernelDensity::estimate(&values, min, max, resolution, bandwidth)?;
            Ok((sweep, epoch, kde.x, kde.y))
        })
        .collect::<Result<Vec<_>>>()?;
    stat_frame(rows, "x", "density")
}

/// Gaussian kernel function
#[inline]
fn gaussian_kernel(u: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.3989422804014327; // 1/sqrt(2*pi)
    INV_SQRT_2PI * (-0.5 * u * u).exp()
}

/// Calculate population standard deviation
fn standard_deviation(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(EpochError::Stats("Empty data".to_string()));
    }

    let mean = data.iter().sum::<f64>() / data.len() as f64;
    let variance = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / data.len() as f64;

    Ok(variance.sqrt())
}

/// Calculate interquartile range (IQR = Q3 - Q1)
fn interquartile_range(data: &[f64]) -> Result<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if n < 4 {
        return Ok(sorted[n - 1] - sorted[0]);
    }

    let q1_index = n / 4;
    let q3_index = 3 * n / 4;

    Ok(sorted[q3_index] - sorted[q1_index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kde_finds_bimodal_peaks() {
        let mut data = Vec::new();
        for _ in 0..100 {
            data.push(0.0);
            data.push(5.0);
        }

        let kde = KernelDensity::estimate(&data, -2.0, 7.0, 256, Bandwidth::Silverman).unwrap();
        let peaks = kde.find_peaks(0.3);
        assert_eq!(peaks.len(), 2);
        assert!(peaks[0].abs() < 0.5);
        assert!((peaks[1] - 5.0).abs() < 0.5);
    }

    #[test]
    fn test_kde_grid_spans_requested_range() {
        let data = vec![1.0, 2.0, 3.0, 2.0, 1.5];
        let kde = KernelDensity::estimate(&data, 0.0, 4.0, 11, Bandwidth::Scott).unwrap();
        assert_eq!(kde.x.len(), 11);
        assert_relative_eq!(kde.x[0], 0.0);
        assert_relative_eq!(kde.x[10], 4.0);
    }

    #[test]
    fn test_kde_integrates_to_roughly_one() {
        let data: Vec<f64> = (0..200).map(|i| (i as f64 * 0.7).sin()).collect();
        let kde = KernelDensity::estimate(&data, -3.0, 3.0, 600, Bandwidth::Scott).unwrap();
        let dx = kde.x[1] - kde.x[0];
        let integral: f64 = kde.y.iter().sum::<f64>() * dx;
        assert!((integral - 1.0).abs() < 0.05, "integral = {integral}");
    }

    #[test]
    fn test_kde_rejects_constant_data_with_automatic_bandwidth() {
        let data = vec![2.0; 50];
        assert!(KernelDensity::estimate(&data, 0.0, 4.0, 32, Bandwidth::Scott).is_err());
        // an explicit bandwidth still works
        assert!(
            KernelDensity::estimate(&data, 0.0, 4.0, 32, Bandwidth::Fixed(0.5)).is_ok()
        );
    }

    #[test]
    fn test_kde_insufficient_data() {
        assert!(matches!(
            KernelDensity::estimate(&[1.0, f64::NAN], 0.0, 1.0, 16, Bandwidth::Scott),
            Err(EpochError::InsufficientData { actual: 1, .. })
        ));
    }

    #[test]
    fn test_default_resolution_is_five_per_unit() {
        assert_eq!(default_resolution(-70.0, -30.0), 200);
        assert_eq!(default_resolution(0.0, 0.1), 2);
    }
}
