use crate::PlotBytes;
use crate::nice_bounds;
use crate::options::RasterPlotOptions;
use crate::plots::traits::Plot;
use crate::render::plotters_backend::{ChartSpec, render_chart};
use crate::render::{ProgressInfo, RenderConfig};
use anyhow::{Result, anyhow};
use plotters::element::{Circle, PathElement};
use plotters::style::Color;
use plotters::style::colors::full_palette::GREY;

/// Event-time raster plot implementation
///
/// One row per sweep reading top-down (sweep 1 at the top), a vertical tick
/// per event time. Row ticks are labeled with the sweep number.
pub struct RasterPlot;

impl RasterPlot {
    /// Create a new RasterPlot instance
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for RasterPlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Plot for RasterPlot {
    type Options = RasterPlotOptions;
    type Data = Vec<(String, Vec<f64>)>;

    fn render(
        &self,
        data: Self::Data,
        options: &Self::Options,
        render_config: &mut RenderConfig,
    ) -> Result<PlotBytes> {
        if data.is_empty() {
            return Err(anyhow!("Raster plot has no rows to draw"));
        }

        let n = data.len();
        let x_range = match &options.x_axis.range {
            Some(range) => *range.start()..*range.end(),
            None => {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for (_, times) in &data {
                    for &t in times.iter().filter(|t| t.is_finite()) {
                        min = min.min(t);
                        max = max.max(t);
                    }
                }
                for (_, x) in &options.x_lines {
                    min = min.min(*x);
                    max = max.max(*x);
                }
                nice_bounds(min, max)
            }
        };
        let y_range = 0.5..(n as f64 + 0.5);

        let mut spec = ChartSpec::new(
            &options.base,
            crate::options::FrameStyle::Simple,
            x_range,
            y_range,
        );
        spec.x_label = options.x_axis.label.as_deref();
        spec.y_tick_count = n;
        // Row i is drawn at y = n - i so the first sweep reads at the top;
        // tick labels undo the flip
        spec.y_formatter = Some(Box::new(move |y: &f64| {
            let row = y.round();
            if (y - row).abs() < 1e-6 && row >= 1.0 && row <= n as f64 {
                format!("{}", n + 1 - row as usize)
            } else {
                String::new()
            }
        }));

        render_chart(spec, render_config, |chart, render_config| {
            for (index, (label, times)) in data.iter().enumerate() {
                let y_center = (n - index) as f64;
                chart
                    .draw_series(times.iter().filter(|t| t.is_finite()).map(|&t| {
                        PathElement::new(
                            vec![(t, y_center - 0.5), (t, y_center + 0.5)],
                            options.color.stroke_width(options.stroke_width),
                        )
                    }))
                    .map_err(|e| anyhow!("failed to draw raster row {:?}: {e}", label))?;
                render_config.report_progress(ProgressInfo {
                    stage: format!("row {}/{}", index + 1, n),
                    percent: 10.0 + 70.0 * (index + 1) as f32 / n as f32,
                });
            }

            // dotted vertical reference lines
            let y_span = chart.y_range();
            for (label, x) in &options.x_lines {
                const DOTS: usize = 60;
                let step = (y_span.end - y_span.start) / DOTS as f64;
                chart
                    .draw_series((0..=DOTS).map(|i| {
                        Circle::new((*x, y_span.start + i as f64 * step), 1, GREY.filled())
                    }))
                    .map_err(|e| anyhow!("failed to draw reference line {:?}: {e}", label))?;
            }
            Ok(())
        })
    }
}
