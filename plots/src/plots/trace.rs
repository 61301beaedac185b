use crate::PlotBytes;
use crate::colormap::resolve_series_color;
use crate::options::TracePlotOptions;
use crate::plots::traits::Plot;
use crate::render::plotters_backend::{ChartSpec, render_chart};
use crate::render::{ProgressInfo, RenderConfig};
use crate::{nice_bounds, PlotRange};
use anyhow::{Result, anyhow};
use plotters::series::LineSeries;
use plotters::style::Color;

/// One polyline of a trace figure
#[derive(Clone, Debug)]
pub struct TraceSeries {
    /// Series name (usually a sweep or epoch label)
    pub label: String,
    /// (x, y) samples in plot order
    pub points: Vec<(f64, f64)>,
}

/// Sweep/stat trace plot implementation
///
/// Draws one polyline per series. With `FrameStyle::Clean` and a
/// [`crate::options::ScaleBar`] this reproduces the minimalist trace figure:
/// nothing but the data and two calibrated bars.
pub struct TracePlot;

impl TracePlot {
    /// Create a new TracePlot instance
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracePlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Plot for TracePlot {
    type Options = TracePlotOptions;
    type Data = Vec<TraceSeries>;

    fn render(
        &self,
        data: Self::Data,
        options: &Self::Options,
        render_config: &mut RenderConfig,
    ) -> Result<PlotBytes> {
        if data.is_empty() || data.iter().all(|s| s.points.is_empty()) {
            return Err(anyhow!("Trace plot has no points to draw"));
        }

        let x_range = resolve_range(options.x_axis.range.clone(), &data, |p| p.0);
        let y_range = resolve_range(options.y_axis.range.clone(), &data, |p| p.1);

        let mut spec = ChartSpec::new(&options.base, options.frame, x_range, y_range);
        spec.x_label = options.x_axis.label.as_deref();
        spec.y_label = options.y_axis.label.as_deref();
        spec.scale_bar = options.scale_bar.as_ref();

        let total = data.len();
        render_chart(spec, render_config, |chart, render_config| {
            for (index, series) in data.iter().enumerate() {
                let color = resolve_series_color(options.colormap, index, total);
                chart
                    .draw_series(LineSeries::new(
                        series.points.iter().copied(),
                        color.stroke_width(options.stroke_width),
                    ))
                    .map_err(|e| {
                        anyhow!("failed to draw trace series {:?}: {e}", series.label)
                    })?;
                render_config.report_progress(ProgressInfo {
                    stage: format!("series {}/{}", index + 1, total),
                    percent: 10.0 + 70.0 * (index + 1) as f32 / total as f32,
                });
            }
            Ok(())
        })
    }
}

/// Fixed range when the caller set one, nice-padded data bounds otherwise
fn resolve_range(
    fixed: Option<PlotRange>,
    data: &[TraceSeries],
    pick: impl Fn(&(f64, f64)) -> f64,
) -> std::ops::Range<f64> {
    if let Some(range) = fixed {
        return *range.start()..*range.end();
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for series in data {
        for point in &series.points {
            let v = pick(point);
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
            }
        }
    }
    nice_bounds(min, max)
}
