use crate::PlotRange;
use derive_builder::Builder;

/// Options for configuring a plot axis
///
/// Controls the range and label for a single axis. A `None` range means
/// "fit the data", padded out to nice bounds at render time.
///
/// # Example
///
/// ```rust,no_run
/// use ephys_plots::options::AxisOptions;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let axis = AxisOptions::new()
///     .range(-80.0..=-20.0)
///     .label("Vm (mV)")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Builder, Clone, Debug, Default)]
#[builder(setter(into, strip_option), default)]
pub struct AxisOptions {
    /// Data range for this axis; `None` fits the data
    pub range: Option<PlotRange>,

    /// Optional axis label
    pub label: Option<String>,
}

impl AxisOptions {
    /// Create a new builder for AxisOptions
    pub fn new() -> AxisOptionsBuilder {
        AxisOptionsBuilder::default()
    }
}
