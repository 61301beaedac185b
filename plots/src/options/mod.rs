pub mod axis;
pub mod base;
pub mod boxplot;
pub mod frame;
pub mod raster;
pub mod scatter;
pub mod trace;

pub use axis::{AxisOptions, AxisOptionsBuilder};
pub use base::{BasePlotOptions, BasePlotOptionsBuilder};
pub use boxplot::{BoxPlotOptions, BoxPlotOptionsBuilder};
pub use frame::{FrameStyle, ScaleBar};
pub use raster::{RasterPlotOptions, RasterPlotOptionsBuilder};
pub use scatter::{ScatterColumnOptions, ScatterColumnOptionsBuilder};
pub use trace::{TracePlotOptions, TracePlotOptionsBuilder};

/// Trait for plot options types
///
/// All plot-specific options structs should implement this trait to provide
/// access to the base options.
pub trait PlotOptions {
    /// Get a reference to the base plot options
    fn base(&self) -> &BasePlotOptions;
}
