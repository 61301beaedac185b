use crate::colormap::ColorMaps;
use crate::options::{AxisOptions, BasePlotOptions, PlotOptions};
use derive_builder::Builder;

/// Options for boxplots
///
/// One box per named column. Whiskers sit at percentiles rather than the
/// 1.5·IQR convention (10/90 by default), with points beyond them drawn as
/// outlier dots.
///
/// # Example
///
/// ```rust,no_run
/// use ephys_plots::options::BoxPlotOptions;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let options = BoxPlotOptions::new()
///     .medians_only(true)
///     .y_lines(vec![("baseline".to_string(), -50.0)])
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Builder, Clone, Debug)]
#[builder(setter(into, strip_option), default)]
pub struct BoxPlotOptions {
    /// Base plot options (layout, dimensions, etc.)
    #[builder(default)]
    pub base: BasePlotOptions,

    /// Y-axis configuration (the x axis carries the column labels)
    #[builder(default)]
    pub y_axis: AxisOptions,

    /// Whisker percentiles as fractions, low then high
    #[builder(default = "(0.10, 0.90)")]
    pub whisker_percentiles: (f64, f64),

    /// Color only the median bars, leaving the boxes black
    #[builder(default = "false")]
    pub medians_only: bool,

    /// Draw points beyond the whiskers
    #[builder(default = "true")]
    pub show_outliers: bool,

    /// Dotted horizontal reference lines as (label, y) pairs
    #[builder(default)]
    pub y_lines: Vec<(String, f64)>,

    /// Spread box colors over a colormap instead of the default palette
    pub colormap: Option<ColorMaps>,

    /// Box width as a fraction of the column spacing
    #[builder(default = "0.5")]
    pub box_width: f64,
}

impl Default for BoxPlotOptions {
    fn default() -> Self {
        Self {
            base: BasePlotOptions::default(),
            y_axis: AxisOptions::default(),
            whisker_percentiles: (0.10, 0.90),
            medians_only: false,
            show_outliers: true,
            y_lines: Vec::new(),
            colormap: None,
            box_width: 0.5,
        }
    }
}

impl PlotOptions for BoxPlotOptions {
    fn base(&self) -> &BasePlotOptions {
        &self.base
    }
}

impl BoxPlotOptions {
    /// Create a new builder for BoxPlotOptions
    pub fn new() -> BoxPlotOptionsBuilder {
        BoxPlotOptionsBuilder::default()
    }
}
