pub mod boxplot;
pub mod raster;
pub mod scatter_column;
pub mod trace;
pub mod traits;

pub use boxplot::{BoxPlot, BoxWhiskerSummary};
pub use raster::RasterPlot;
pub use scatter_column::ScatterColumnPlot;
pub use trace::{TracePlot, TraceSeries};
pub use traits::Plot;

/// Plot type enumeration
///
/// This enum can be used to dispatch to different plot implementations.
/// However, for better type safety and extensibility, prefer using the
/// `Plot` trait directly with specific plot types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotType {
    /// Sweep or stat-series trace (polyline)
    Trace,
    /// Box-and-whisker plot
    Box,
    /// Jittered scatter column
    ScatterColumn,
    /// Event-time raster
    Raster,
}
