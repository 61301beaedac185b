use crate::PlotBytes;
use crate::options::{BasePlotOptions, FrameStyle, ScaleBar};
use crate::render::{ProgressInfo, RenderConfig};
use anyhow::Result;
use image::{ImageBuffer, ImageEncoder, RgbImage};
use plotters::backend::BitMapBackend;
use plotters::chart::{ChartBuilder, ChartContext, SeriesLabelPosition};
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::element::PathElement;
use plotters::prelude::IntoDrawingArea;
use plotters::style::{BLACK, Color, IntoFont, WHITE};
use std::ops::Range;

/// The cartesian chart all plot types draw into
pub type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Everything the shared scaffolding needs to frame a chart
///
/// Plot implementations fill one of these, hand over a closure that draws
/// their series, and get encoded PNG bytes back without ever touching
/// backend lifetimes.
pub struct ChartSpec<'a> {
    pub base: &'a BasePlotOptions,
    pub frame: FrameStyle,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub x_label: Option<&'a str>,
    pub y_label: Option<&'a str>,
    /// Tick count hints (plotters treats these as maxima)
    pub x_tick_count: usize,
    pub y_tick_count: usize,
    /// Custom tick label formatters (e.g. column names, inverted sweep rows)
    pub x_formatter: Option<Box<dyn Fn(&f64) -> String + 'a>>,
    pub y_formatter: Option<Box<dyn Fn(&f64) -> String + 'a>>,
    pub scale_bar: Option<&'a ScaleBar>,
}

impl<'a> ChartSpec<'a> {
    /// Spec with default furniture for the given ranges
    pub fn new(
        base: &'a BasePlotOptions,
        frame: FrameStyle,
        x_range: Range<f64>,
        y_range: Range<f64>,
    ) -> Self {
        Self {
            base,
            frame,
            x_range,
            y_range,
            x_label: None,
            y_label: None,
            x_tick_count: 10,
            y_tick_count: 10,
            x_formatter: None,
            y_formatter: None,
            scale_bar: None,
        }
    }
}

/// Render a chart to PNG bytes using the Plotters backend
///
/// This function handles the complete rendering pipeline:
/// 1. Sets up the Plotters chart with the requested frame style
/// 2. Runs the plot-specific draw closure
/// 3. Draws scale bars and their legend if requested
/// 4. Encodes the RGB buffer to PNG
///
/// Progress reporting is handled via the RenderConfig if provided.
pub fn render_chart<F>(
    spec: ChartSpec<'_>,
    render_config: &mut RenderConfig,
    draw: F,
) -> Result<PlotBytes>
where
    F: for<'a, 'b> FnOnce(&mut Chart<'a, 'b>, &mut RenderConfig) -> Result<()>,
{
    let width = spec.base.width;
    let height = spec.base.height;

    // RGB buffer (3 bytes per pixel), white background
    let mut pixel_buffer = vec![255u8; (width * height * 3) as usize];

    {
        let backend = BitMapBackend::with_buffer(&mut pixel_buffer, (width, height));
        let root = backend.into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| anyhow::anyhow!("failed to fill plot background: {e}"))?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(spec.base.margin);
        if !spec.base.title.is_empty() {
            builder.caption(&spec.base.title, ("sans-serif", 18).into_font());
        }
        // A clean frame surrenders no pixels to label areas
        if spec.frame != FrameStyle::Clean {
            builder
                .x_label_area_size(spec.base.x_label_area_size)
                .y_label_area_size(spec.base.y_label_area_size);
        }
        let mut chart =
            builder.build_cartesian_2d(spec.x_range.clone(), spec.y_range.clone())?;

        match spec.frame {
            FrameStyle::Full | FrameStyle::Simple => {
                let mut mesh = chart.configure_mesh();
                if spec.frame == FrameStyle::Simple {
                    mesh.disable_mesh();
                }
                mesh.x_labels(spec.x_tick_count).y_labels(spec.y_tick_count);
                if let Some(label) = spec.x_label {
                    mesh.x_desc(label);
                }
                if let Some(label) = spec.y_label {
                    mesh.y_desc(label);
                }
                if let Some(formatter) = &spec.x_formatter {
                    mesh.x_label_formatter(formatter.as_ref());
                }
                if let Some(formatter) = &spec.y_formatter {
                    mesh.y_label_formatter(formatter.as_ref());
                }
                mesh.draw()
                    .map_err(|e| anyhow::anyhow!("failed to draw plot mesh: {e}"))?;
            }
            FrameStyle::Clean => {}
        }

        render_config.report_progress(ProgressInfo {
            stage: "frame".to_string(),
            percent: 10.0,
        });

        draw(&mut chart, render_config)?;

        if let Some(bar) = spec.scale_bar {
            draw_scale_bars(&mut chart, &spec.x_range, &spec.y_range, bar)?;
        }

        root.present()
            .map_err(|e| anyhow::anyhow!("failed to present plotters buffer: {e}"))?;
    } // End Plotters scope - pixel_buffer borrow is released here

    render_config.report_progress(ProgressInfo {
        stage: "encode".to_string(),
        percent: 90.0,
    });

    let img: RgbImage = ImageBuffer::from_vec(width, height, pixel_buffer)
        .ok_or_else(|| anyhow::anyhow!("plot image buffer had unexpected size"))?;

    // PNG suits line art far better than JPEG: crisp 1-px strokes and
    // smaller files for mostly-white figures
    let mut encoded_data = Vec::new();
    image::codecs::png::PngEncoder::new(&mut encoded_data)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| anyhow::anyhow!("failed to PNG encode plot: {e}"))?;

    render_config.report_progress(ProgressInfo {
        stage: "done".to_string(),
        percent: 100.0,
    });

    Ok(encoded_data)
}

/// Draw x/y scale bars in the lower-right corner with a legend
///
/// The horizontal bar hugs the bottom edge ending at the right edge; the
/// vertical bar climbs the right edge from the bottom. Lengths are in data
/// units, so the legend annotation stays honest however the figure is
/// resized.
fn draw_scale_bars(
    chart: &mut Chart<'_, '_>,
    x_range: &Range<f64>,
    y_range: &Range<f64>,
    bar: &ScaleBar,
) -> Result<()> {
    let x_end = x_range.end;
    let y_bottom = y_range.start;
    let style = BLACK.stroke_width(2);

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(x_end - bar.x_length, y_bottom), (x_end, y_bottom)],
            style,
        )))
        .map_err(|e| anyhow::anyhow!("failed to draw x scale bar: {e}"))?
        .label(bar.x_label())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], BLACK.stroke_width(2)));

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(x_end, y_bottom), (x_end, y_bottom + bar.y_length)],
            style,
        )))
        .map_err(|e| anyhow::anyhow!("failed to draw y scale bar: {e}"))?
        .label(bar.y_label())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], BLACK.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(WHITE)
        .draw()
        .map_err(|e| anyhow::anyhow!("failed to draw scale bar legend: {e}"))?;

    Ok(())
}
