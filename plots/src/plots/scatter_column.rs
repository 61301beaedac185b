use crate::PlotBytes;
use crate::colormap::palette_color;
use crate::nice_bounds;
use crate::options::ScatterColumnOptions;
use crate::plots::traits::Plot;
use crate::render::plotters_backend::{ChartSpec, render_chart};
use crate::render::{ProgressInfo, RenderConfig};
use anyhow::{Result, anyhow};
use plotters::element::Circle;
use plotters::style::Color;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Jittered scatter column plot implementation
///
/// Each named column becomes a vertical scatter at x = column index with
/// seeded Gaussian jitter, the honest alternative to a bar chart when every
/// point should stay visible.
pub struct ScatterColumnPlot;

impl ScatterColumnPlot {
    /// Create a new ScatterColumnPlot instance
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScatterColumnPlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Plot for ScatterColumnPlot {
    type Options = ScatterColumnOptions;
    type Data = Vec<(String, Vec<f64>)>;

    fn render(
        &self,
        data: Self::Data,
        options: &Self::Options,
        render_config: &mut RenderConfig,
    ) -> Result<PlotBytes> {
        if data.is_empty() {
            return Err(anyhow!("Scatter column plot has no columns to draw"));
        }

        let n = data.len();
        let x_range = 0.5..(n as f64 + 0.5);
        let y_range = match &options.y_axis.range {
            Some(range) => *range.start()..*range.end(),
            None => {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for (_, values) in &data {
                    for &v in values.iter().filter(|v| v.is_finite()) {
                        min = min.min(v);
                        max = max.max(v);
                    }
                }
                nice_bounds(min, max)
            }
        };

        let labels: Vec<String> = data.iter().map(|(label, _)| label.clone()).collect();
        let mut spec = ChartSpec::new(
            &options.base,
            crate::options::FrameStyle::Simple,
            x_range,
            y_range,
        );
        spec.y_label = options.y_axis.label.as_deref();
        spec.x_tick_count = n;
        spec.x_formatter = Some(Box::new(move |x: &f64| {
            let index = x.round() as usize;
            if (x - x.round()).abs() < 1e-6 && (1..=labels.len()).contains(&index) {
                labels[index - 1].clone()
            } else {
                String::new()
            }
        }));

        // One RNG for the whole figure: same data + same seed = same jitter
        let mut rng = StdRng::seed_from_u64(options.seed);
        let jitter = Normal::new(0.0, options.jitter.max(f64::EPSILON))
            .map_err(|e| anyhow!("invalid jitter width: {e}"))?;

        render_chart(spec, render_config, |chart, render_config| {
            for (index, (label, values)) in data.iter().enumerate() {
                let color = options.mono_color.unwrap_or_else(|| palette_color(index));
                let style = color.mix(options.alpha).filled();
                let center = index as f64 + 1.0;
                chart
                    .draw_series(values.iter().filter(|v| v.is_finite()).map(|&y| {
                        let x = center + jitter.sample(&mut rng);
                        Circle::new((x, y), options.marker_size as i32, style)
                    }))
                    .map_err(|e| anyhow!("failed to draw scatter column {:?}: {e}", label))?;
                render_config.report_progress(ProgressInfo {
                    stage: format!("column {}/{}", index + 1, n),
                    percent: 10.0 + 70.0 * (index + 1) as f32 / n as f32,
                });
            }
            Ok(())
        })
    }
}
