use crate::colormap::ColorMaps;
use crate::options::{AxisOptions, BasePlotOptions, FrameStyle, PlotOptions, ScaleBar};
use derive_builder::Builder;

/// Options for sweep trace plots
///
/// One polyline per series. The default frame is `Simple` (no grid); a
/// `Clean` frame with a scale bar reproduces the minimalist
/// axes-free trace figure.
///
/// # Example
///
/// ```rust,no_run
/// use ephys_plots::options::{FrameStyle, ScaleBar, TracePlotOptions};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let options = TracePlotOptions::new()
///     .frame(FrameStyle::Clean)
///     .scale_bar(ScaleBar::new(0.5, "s", 10.0, "mV"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Builder, Clone, Debug)]
#[builder(setter(into, strip_option), default)]
pub struct TracePlotOptions {
    /// Base plot options (layout, dimensions, etc.)
    #[builder(default)]
    pub base: BasePlotOptions,

    /// X-axis configuration
    #[builder(default)]
    pub x_axis: AxisOptions,

    /// Y-axis configuration
    #[builder(default)]
    pub y_axis: AxisOptions,

    /// How much chart furniture to draw
    #[builder(default)]
    pub frame: FrameStyle,

    /// Optional x/y scale bars with a legend
    pub scale_bar: Option<ScaleBar>,

    /// Spread series colors over a colormap instead of the default palette
    pub colormap: Option<ColorMaps>,

    /// Line weight in pixels
    #[builder(default = "1")]
    pub stroke_width: u32,
}

impl Default for TracePlotOptions {
    fn default() -> Self {
        Self {
            base: BasePlotOptions::default(),
            x_axis: AxisOptions::default(),
            y_axis: AxisOptions::default(),
            frame: FrameStyle::default(),
            scale_bar: None,
            colormap: None,
            stroke_width: 1,
        }
    }
}

impl PlotOptions for TracePlotOptions {
    fn base(&self) -> &BasePlotOptions {
        &self.base
    }
}

impl TracePlotOptions {
    /// Create a new builder for TracePlotOptions
    pub fn new() -> TracePlotOptionsBuilder {
        TracePlotOptionsBuilder::default()
    }
}
