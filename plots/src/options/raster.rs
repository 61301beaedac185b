use plotters::style::{BLACK, RGBColor};

use crate::options::{AxisOptions, BasePlotOptions, PlotOptions};
use derive_builder::Builder;

/// Options for event-time raster plots
///
/// One row per sweep reading top-down, a vertical tick per event.
///
/// # Example
///
/// ```rust,no_run
/// use ephys_plots::options::RasterPlotOptions;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let options = RasterPlotOptions::new()
///     .x_lines(vec![("stim on".to_string(), 0.5)])
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Builder, Clone, Debug)]
#[builder(setter(into, strip_option), default)]
pub struct RasterPlotOptions {
    /// Base plot options (layout, dimensions, etc.)
    #[builder(default)]
    pub base: BasePlotOptions,

    /// X-axis configuration (the y axis carries the sweep rows)
    #[builder(default)]
    pub x_axis: AxisOptions,

    /// Tick color
    #[builder(default = "BLACK")]
    pub color: RGBColor,

    /// Dotted vertical reference lines as (label, x) pairs
    #[builder(default)]
    pub x_lines: Vec<(String, f64)>,

    /// Tick weight in pixels
    #[builder(default = "1")]
    pub stroke_width: u32,
}

impl Default for RasterPlotOptions {
    fn default() -> Self {
        Self {
            base: BasePlotOptions::default(),
            x_axis: AxisOptions::default(),
            color: BLACK,
            x_lines: Vec::new(),
            stroke_width: 1,
        }
    }
}

impl PlotOptions for RasterPlotOptions {
    fn base(&self) -> &BasePlotOptions {
        &self.base
    }
}

impl RasterPlotOptions {
    /// Create a new builder for RasterPlotOptions
    pub fn new() -> RasterPlotOptionsBuilder {
        RasterPlotOptionsBuilder::default()
    }
}
