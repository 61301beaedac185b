use serde::{Deserialize, Serialize};

/// How much chart furniture to draw around the data
///
/// Publication figures usually want less than the default: `Simple` keeps
/// the bottom/left axes and drops the grid, and `Clean` drops the axes
/// entirely (pair it with a [`ScaleBar`] so the figure stays quantitative).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameStyle {
    /// Grid lines, axes, ticks, and labels
    Full,
    /// Axes, ticks, and labels only
    #[default]
    Simple,
    /// No axes at all
    Clean,
}

/// X and Y scale bars drawn in the lower-right of the plot area
///
/// The bars span `x_length`/`y_length` in data units and are annotated in
/// the series legend (e.g. `x: 0.5 s`, `y: 10 mV`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScaleBar {
    /// Length of the horizontal bar in x data units
    pub x_length: f64,
    /// X-axis units shown in the legend
    pub x_units: String,
    /// Length of the vertical bar in y data units
    pub y_length: f64,
    /// Y-axis units shown in the legend
    pub y_units: String,
}

impl ScaleBar {
    #[must_use]
    pub fn new(x_length: f64, x_units: &str, y_length: f64, y_units: &str) -> Self {
        Self {
            x_length,
            x_units: x_units.to_string(),
            y_length,
            y_units: y_units.to_string(),
        }
    }

    /// Legend annotation for the horizontal bar
    #[must_use]
    pub fn x_label(&self) -> String {
        format!("x: {} {}", self.x_length, self.x_units)
    }

    /// Legend annotation for the vertical bar
    #[must_use]
    pub fn y_label(&self) -> String {
        format!("y: {} {}", self.y_length, self.y_units)
    }
}
