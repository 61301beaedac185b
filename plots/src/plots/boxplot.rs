use crate::PlotBytes;
use crate::colormap::resolve_series_color;
use crate::options::BoxPlotOptions;
use crate::plots::traits::Plot;
use crate::render::plotters_backend::{Chart, ChartSpec, render_chart};
use crate::render::{ProgressInfo, RenderConfig};
use crate::nice_bounds;
use anyhow::{Result, anyhow};
use plotters::element::{Circle, PathElement, Rectangle};
use plotters::style::{BLACK, Color, RGBColor, ShapeStyle};
use serde::Serialize;

/// Five-number summary (plus outliers) backing one box
///
/// Whiskers are percentile-based rather than 1.5·IQR fences; everything
/// beyond them is an outlier.
#[derive(Clone, Debug, Serialize)]
pub struct BoxWhiskerSummary {
    pub label: String,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxWhiskerSummary {
    /// Summarize one column of values with whiskers at the given percentiles
    ///
    /// Non-finite values are dropped first.
    ///
    /// # Errors
    /// Will return `Err` if no finite values remain or the percentiles are not ordered fractions
    pub fn compute(label: &str, values: &[f64], percentiles: (f64, f64)) -> Result<Self> {
        let (low, high) = percentiles;
        if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&high) || low >= high {
            return Err(anyhow!("Invalid whisker percentiles: ({low}, {high})"));
        }
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Err(anyhow!("No finite values for boxplot column {:?}", label));
        }
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let lower_whisker = percentile(&sorted, low);
        let upper_whisker = percentile(&sorted, high);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|&v| v < lower_whisker || v > upper_whisker)
            .collect();

        Ok(Self {
            label: label.to_string(),
            lower_whisker,
            q1: percentile(&sorted, 0.25),
            median: percentile(&sorted, 0.50),
            q3: percentile(&sorted, 0.75),
            upper_whisker,
            outliers,
        })
    }

    fn value_span(&self) -> (f64, f64) {
        let mut min = self.lower_whisker;
        let mut max = self.upper_whisker;
        for &v in &self.outliers {
            min = min.min(v);
            max = max.max(v);
        }
        (min, max)
    }
}

/// Linear-interpolation percentile of pre-sorted values
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p * (sorted.len() - 1) as f64;
    let below = rank.floor() as usize;
    let above = rank.ceil() as usize;
    let fraction = rank - below as f64;
    sorted[below] + (sorted[above] - sorted[below]) * fraction
}

/// Box-and-whisker plot implementation
///
/// One box per named column at x = 1, 2, …, column names as tick labels.
/// Boxes are colored through the palette (or a colormap); `medians_only`
/// keeps the boxes black and colors just the median bars, the high-contrast
/// variant for dense figures.
pub struct BoxPlot;

impl BoxPlot {
    /// Create a new BoxPlot instance
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for BoxPlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Plot for BoxPlot {
    type Options = BoxPlotOptions;
    type Data = Vec<(String, Vec<f64>)>;

    fn render(
        &self,
        data: Self::Data,
        options: &Self::Options,
        render_config: &mut RenderConfig,
    ) -> Result<PlotBytes> {
        if data.is_empty() {
            return Err(anyhow!("Boxplot has no columns to draw"));
        }

        let summaries = data
            .iter()
            .map(|(label, values)| {
                BoxWhiskerSummary::compute(label, values, options.whisker_percentiles)
            })
            .collect::<Result<Vec<_>>>()?;

        let n = summaries.len();
        let x_range = 0.5..(n as f64 + 0.5);
        let y_range = match &options.y_axis.range {
            Some(range) => *range.start()..*range.end(),
            None => {
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for summary in &summaries {
                    let (lo, hi) = summary.value_span();
                    min = min.min(lo);
                    max = max.max(hi);
                }
                for (_, y) in &options.y_lines {
                    min = min.min(*y);
                    max = max.max(*y);
                }
                nice_bounds(min, max)
            }
        };

        let labels: Vec<String> = summaries.iter().map(|s| s.label.clone()).collect();
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

        render_chart(spec, render_config, |chart, render_config| {
            for (index, summary) in summaries.iter().enumerate() {
                let color = resolve_series_color(options.colormap, index, n);
                draw_box(chart, index as f64 + 1.0, summary, options, color)?;
                render_config.report_progress(ProgressInfo {
                    stage: format!("box {}/{}", index + 1, n),
                    percent: 10.0 + 70.0 * (index + 1) as f32 / n as f32,
                });
            }
            draw_reference_lines(chart, &options.y_lines)?;
            Ok(())
        })
    }
}

fn draw_box(
    chart: &mut Chart<'_, '_>,
    x: f64,
    summary: &BoxWhiskerSummary,
    options: &BoxPlotOptions,
    color: RGBColor,
) -> Result<()> {
    let half = options.box_width / 2.0;
    let cap = half / 2.0;
    let (box_color, median_color) = if options.medians_only {
        (BLACK, color)
    } else {
        (color, color)
    };
    let box_style: ShapeStyle = box_color.stroke_width(2);
    let median_style: ShapeStyle = median_color.stroke_width(4);

    let mut elements: Vec<PathElement<(f64, f64)>> = vec![
        // whisker stems
        PathElement::new(
            vec![(x, summary.lower_whisker), (x, summary.q1)],
            box_style,
        ),
        PathElement::new(
            vec![(x, summary.q3), (x, summary.upper_whisker)],
            box_style,
        ),
        // whisker caps
        PathElement::new(
            vec![
                (x - cap, summary.lower_whisker),
                (x + cap, summary.lower_whisker),
            ],
            box_style,
        ),
        PathElement::new(
            vec![
                (x - cap, summary.upper_whisker),
                (x + cap, summary.upper_whisker),
            ],
            box_style,
        ),
    ];
    elements.push(PathElement::new(
        vec![(x - half, summary.median), (x + half, summary.median)],
        median_style,
    ));
    chart
        .draw_series(elements)
        .map_err(|e| anyhow!("failed to draw box for {:?}: {e}", summary.label))?;

    // outline only, so the median bar stays visible
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(x - half, summary.q1), (x + half, summary.q3)],
            box_style,
        )))
        .map_err(|e| anyhow!("failed to draw box body for {:?}: {e}", summary.label))?;

    if options.show_outliers {
        let dot_color = if options.medians_only { BLACK } else { color };
        chart
            .draw_series(
                summary
                    .outliers
                    .iter()
                    .map(|&v| Circle::new((x, v), 2, dot_color.filled())),
            )
            .map_err(|e| anyhow!("failed to draw outliers for {:?}: {e}", summary.label))?;
    }
    Ok(())
}

/// Dotted horizontal reference lines spanning the full x range
fn draw_reference_lines(
    chart: &mut Chart<'_, '_>,
    y_lines: &[(String, f64)],
) -> Result<()> {
    let x_range = chart.x_range();
    for (label, y) in y_lines {
        let dots: Vec<(f64, f64)> = dotted_span(x_range.start, x_range.end)
            .map(|x| (x, *y))
            .collect();
        chart
            .draw_series(
                dots.iter()
                    .map(|&(x, y)| Circle::new((x, y), 1, plotters::style::colors::full_palette::GREY.filled())),
            )
            .map_err(|e| anyhow!("failed to draw reference line {:?}: {e}", label))?;
    }
    Ok(())
}

/// Evenly spaced sample points approximating a dotted line
fn dotted_span(start: f64, end: f64) -> impl Iterator<Item = f64> {
    const DOTS: usize = 80;
    let step = (end - start) / DOTS as f64;
    (0..=DOTS).map(move |i| start + i as f64 * step)
}
