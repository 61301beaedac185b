//! # ephys-plots
//!
//! A library for creating publication-style figures from electrophysiology
//! sweep data.
//!
//! ## Overview
//!
//! This library provides a flexible, extensible API for rendering the plot
//! types the analysis pipeline produces: sweep traces (with optional scale
//! bars instead of axes), boxplots, jittered scatter columns, and event
//! rasters. The architecture is designed to be easily extended with new
//! plot types.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use ephys_plots::{TracePlot, TracePlotOptions, TraceSeries};
//! use ephys_plots::plots::Plot;
//! use ephys_plots::render::RenderConfig;
//!
//! # fn main() -> anyhow::Result<()> {
//! let plot = TracePlot::new();
//! let options = TracePlotOptions::new().build()?;
//! let data = vec![TraceSeries {
//!     label: "sweep001".to_string(),
//!     points: vec![(0.0, -50.0), (0.1, -49.0)],
//! }];
//! let mut render_config = RenderConfig::default();
//! let bytes = plot.render(data, &options, &mut render_config)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - `options`: Plot configuration types using the builder pattern
//! - `plots`: Plot implementations (trace, boxplot, scatter column, raster)
//! - `render`: Chart scaffolding, PNG encoding, and progress reporting
//! - `colormap`: Color map and palette implementations
//! - `helpers`: Bridges from sweep/stat tables to plot data

pub mod colormap;
pub mod helpers;
pub mod options;
pub mod plots;
pub mod render;
mod tests;

// Re-export commonly used types
pub use colormap::ColorMaps;
pub use helpers::{save_plot, stat_series, sweep_series, trace_options_from_abf};
pub use options::{
    AxisOptions, BasePlotOptions, BoxPlotOptions, FrameStyle, PlotOptions, RasterPlotOptions,
    ScaleBar, ScatterColumnOptions, TracePlotOptions,
};
pub use plots::{BoxPlot, Plot, PlotType, RasterPlot, ScatterColumnPlot, TracePlot, TraceSeries};
pub use render::{ProgressCallback, ProgressInfo, RenderConfig};

// Type aliases
pub type PlotBytes = Vec<u8>;
pub type PlotRange = std::ops::RangeInclusive<f64>;

use std::ops::Range;

/// Calculate percentile bounds for a dataset
///
/// Returns a range that encompasses the specified percentiles of the data,
/// rounded to "nice" numbers for better axis display. Used for auto-ranging
/// axes so one stray artifact does not flatten the whole figure.
#[must_use]
pub fn get_percentile_bounds(
    values: &[f64],
    percentile_low: f64,
    percentile_high: f64,
) -> PlotRange {
    if values.is_empty() {
        return 0.0..=1.0;
    }
    let mut sorted_values = values.to_vec();
    sorted_values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let low_index = (percentile_low * sorted_values.len() as f64).floor() as usize;
    let high_index = (percentile_high * sorted_values.len() as f64).ceil() as usize;

    // Ensure indices are within bounds
    let low_index = low_index.clamp(0, sorted_values.len() - 1);
    let high_index = high_index.clamp(0, sorted_values.len() - 1);

    let low_value = sorted_values[low_index];
    let high_value = sorted_values[high_index];

    // Round outward to nice numbers
    let min_bound = nice_floor(low_value);
    let max_bound = nice_ceil(high_value);

    min_bound..=max_bound
}

/// Expand a raw data range to "nice" axis bounds
#[must_use]
pub fn nice_bounds(min: f64, max: f64) -> Range<f64> {
    if min.is_infinite() || max.is_infinite() || min.is_nan() || max.is_nan() {
        return 0.0..1.0; // Fallback for invalid ranges
    }

    let range = max - min;
    if range == 0.0 {
        return (min - 0.5)..(min + 0.5); // Handle single-point case
    }

    // Find nice step size
    let step_size = 10f64.powf(range.log10().floor());
    let nice_min = (min / step_size).floor() * step_size;
    let nice_max = (max / step_size).ceil() * step_size;

    nice_min..nice_max
}

/// Largest "nice" number (1/2/5 × 10^k grid) not above `value`
fn nice_magnitude_down(abs_value: f64) -> f64 {
    let exponent = abs_value.log10().floor() as i32;
    let factor = 10f64.powi(exponent);
    let mantissa = (abs_value / factor).floor();
    if mantissa >= 5.0 {
        5.0 * factor
    } else if mantissa >= 2.0 {
        2.0 * factor
    } else if mantissa >= 1.0 {
        factor
    } else {
        0.5 * factor
    }
}

/// Smallest "nice" number (1/2/5 × 10^k grid) not below `value`
fn nice_magnitude_up(abs_value: f64) -> f64 {
    let exponent = abs_value.log10().floor() as i32;
    let factor = 10f64.powi(exponent);
    let mantissa = (abs_value / factor).ceil();
    if mantissa <= 1.0 {
        factor
    } else if mantissa <= 2.0 {
        2.0 * factor
    } else if mantissa <= 5.0 {
        5.0 * factor
    } else {
        10.0 * factor
    }
}

/// Round down to a nice number, respecting sign (down = toward -∞)
#[must_use]
pub fn nice_floor(value: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    if value.is_sign_negative() {
        -nice_magnitude_up(value.abs())
    } else {
        nice_magnitude_down(value)
    }
}

/// Round up to a nice number, respecting sign (up = toward +∞)
#[must_use]
pub fn nice_ceil(value: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    if value.is_sign_negative() {
        -nice_magnitude_down(value.abs())
    } else {
        nice_magnitude_up(value)
    }
}
