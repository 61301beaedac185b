use plotters::style::RGBColor;

use crate::options::{AxisOptions, BasePlotOptions, PlotOptions};
use derive_builder::Builder;

/// Options for jittered scatter column plots
///
/// Each named column becomes a vertical scatter at x = column index, with
/// Gaussian jitter so overlapping points stay visible. The jitter is
/// seeded, so the same data and seed always produce the same figure.
///
/// # Example
///
/// ```rust,no_run
/// use ephys_plots::options::ScatterColumnOptions;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let options = ScatterColumnOptions::new()
///     .jitter(0.08)
///     .seed(7u64)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Builder, Clone, Debug)]
#[builder(setter(into, strip_option), default)]
pub struct ScatterColumnOptions {
    /// Base plot options (layout, dimensions, etc.)
    #[builder(default)]
    pub base: BasePlotOptions,

    /// Y-axis configuration (the x axis carries the column labels)
    #[builder(default)]
    pub y_axis: AxisOptions,

    /// Marker opacity, 0.0 transparent through 1.0 opaque
    #[builder(default = "0.35")]
    pub alpha: f64,

    /// Jitter standard deviation in column-spacing units
    #[builder(default = "0.05")]
    pub jitter: f64,

    /// Marker radius in pixels
    #[builder(default = "4")]
    pub marker_size: u32,

    /// Draw every column in this color instead of cycling the palette
    pub mono_color: Option<RGBColor>,

    /// Jitter RNG seed; same data + same seed = same figure
    #[builder(default = "0")]
    pub seed: u64,
}

impl Default for ScatterColumnOptions {
    fn default() -> Self {
        Self {
            base: BasePlotOptions::default(),
            y_axis: AxisOptions::default(),
            alpha: 0.35,
            jitter: 0.05,
            marker_size: 4,
            mono_color: None,
            seed: 0,
        }
    }
}

impl PlotOptions for ScatterColumnOptions {
    fn base(&self) -> &BasePlotOptions {
        &self.base
    }
}

impl ScatterColumnOptions {
    /// Create a new builder for ScatterColumnOptions
    pub fn new() -> ScatterColumnOptionsBuilder {
        ScatterColumnOptionsBuilder::default()
    }
}
