// Tests for ephys-plots
//
// Rendering tests check that each plot type produces a valid PNG without
// touching a display; summary tests pin down the percentile math the
// boxplot relies on.

#[cfg(test)]
mod tests {
    use crate::colormap::{ColorMaps, palette_color};
    use crate::helpers::{save_plot, stat_series, sweep_series};
    use crate::options::{
        AxisOptions, BasePlotOptions, BoxPlotOptions, FrameStyle, RasterPlotOptions, ScaleBar,
        ScatterColumnOptions, TracePlotOptions,
    };
    use crate::plots::boxplot::BoxWhiskerSummary;
    use crate::plots::{BoxPlot, Plot, RasterPlot, ScatterColumnPlot, TracePlot, TraceSeries};
    use crate::render::RenderConfig;
    use crate::{get_percentile_bounds, nice_bounds};
    use approx::assert_relative_eq;
    use polars::prelude::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn sine_series(n: usize) -> Vec<TraceSeries> {
        (0..n)
            .map(|s| TraceSeries {
                label: format!("sweep{:03}", s + 1),
                points: (0..200)
                    .map(|k| {
                        let t = k as f64 * 1e-3;
                        (t, -50.0 + 5.0 * (40.0 * t + s as f64).sin())
                    })
                    .collect(),
            })
            .collect()
    }

    // ============================================================================
    // Options builders
    // ============================================================================

    #[test]
    fn test_base_plot_options_default() {
        let options = BasePlotOptions::default();
        assert_eq!(options.width, 640);
        assert_eq!(options.height, 480);
        assert_eq!(options.margin, 10);
        assert_eq!(options.title, "");
    }

    #[test]
    fn test_base_plot_options_builder_partial() {
        let options = BasePlotOptions::new()
            .width(1000u32)
            .title("Sweeps")
            .build()
            .unwrap();
        assert_eq!(options.width, 1000);
        assert_eq!(options.height, 480);
        assert_eq!(options.title, "Sweeps");
    }

    #[test]
    fn test_trace_options_builder() {
        let options = TracePlotOptions::new()
            .frame(FrameStyle::Clean)
            .scale_bar(ScaleBar::new(0.5, "s", 10.0, "mV"))
            .stroke_width(2u32)
            .build()
            .unwrap();
        assert_eq!(options.frame, FrameStyle::Clean);
        assert_eq!(options.stroke_width, 2);
        let bar = options.scale_bar.unwrap();
        assert_eq!(bar.x_label(), "x: 0.5 s");
        assert_eq!(bar.y_label(), "y: 10 mV");
    }

    #[test]
    fn test_axis_options_range() {
        let axis = AxisOptions::new().range(-80.0..=-20.0).build().unwrap();
        assert_eq!(axis.range, Some(-80.0..=-20.0));
        assert!(AxisOptions::default().range.is_none());
    }

    // ============================================================================
    // Helpers
    // ============================================================================

    #[test]
    fn test_percentile_bounds_round_outward() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let bounds = get_percentile_bounds(&values, 0.05, 0.95);
        assert!(*bounds.start() <= 5.0);
        assert!(*bounds.end() >= 95.0);
    }

    #[test]
    fn test_nice_bounds_degenerate_ranges() {
        let r = nice_bounds(3.0, 3.0);
        assert_relative_eq!(r.start, 2.5);
        assert_relative_eq!(r.end, 3.5);
        let r = nice_bounds(f64::NAN, 1.0);
        assert_relative_eq!(r.start, 0.0);
        assert_relative_eq!(r.end, 1.0);
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(palette_color(0), palette_color(10));
    }

    #[test]
    fn test_colormap_endpoints_differ() {
        let map = ColorMaps::Viridis;
        assert_ne!(map.map(0.0), map.map(1.0));
        // single series collapses to the low end
        assert_eq!(map.series_color(0, 1), map.map(0.0));
    }

    // ============================================================================
    // Box summaries
    // ============================================================================

    #[test]
    fn test_box_summary_quartiles() {
        let values: Vec<f64> = (1..=101).map(f64::from).collect();
        let summary = BoxWhiskerSummary::compute("col", &values, (0.10, 0.90)).unwrap();
        assert_relative_eq!(summary.median, 51.0);
        assert_relative_eq!(summary.q1, 26.0);
        assert_relative_eq!(summary.q3, 76.0);
        assert_relative_eq!(summary.lower_whisker, 11.0);
        assert_relative_eq!(summary.upper_whisker, 91.0);
        // 1..=10 and 92..=101 fall beyond the whiskers
        assert_eq!(summary.outliers.len(), 20);
    }

    #[test]
    fn test_box_summary_drops_non_finite() {
        let values = vec![1.0, f64::NAN, 2.0, f64::INFINITY, 3.0];
        let summary = BoxWhiskerSummary::compute("col", &values, (0.10, 0.90)).unwrap();
        assert_relative_eq!(summary.median, 2.0);
    }

    #[test]
    fn test_box_summary_rejects_bad_input() {
        assert!(BoxWhiskerSummary::compute("col", &[f64::NAN], (0.1, 0.9)).is_err());
        assert!(BoxWhiskerSummary::compute("col", &[1.0], (0.9, 0.1)).is_err());
    }

    // ============================================================================
    // Rendering
    // ============================================================================

    #[test]
    fn test_trace_plot_renders_png() {
        let bytes = TracePlot::new()
            .render(
                sine_series(3),
                &TracePlotOptions::default(),
                &mut RenderConfig::default(),
            )
            .unwrap();
        assert_eq!(&bytes[..8], &PNG_MAGIC);
    }

    #[test]
    fn test_trace_plot_clean_frame_with_scale_bar() {
        let options = TracePlotOptions::new()
            .frame(FrameStyle::Clean)
            .scale_bar(ScaleBar::new(0.05, "s", 5.0, "mV"))
            .build()
            .unwrap();
        let bytes = TracePlot::new()
            .render(sine_series(1), &options, &mut RenderConfig::default())
            .unwrap();
        assert_eq!(&bytes[..8], &PNG_MAGIC);
    }

    #[test]
    fn test_trace_plot_rejects_empty_data() {
        assert!(
            TracePlot::new()
                .render(
                    vec![],
                    &TracePlotOptions::default(),
                    &mut RenderConfig::default()
                )
                .is_err()
        );
    }

    #[test]
    fn test_trace_plot_reports_progress() {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&seen);
        let mut config = RenderConfig {
            progress: Some(Box::new(move |info| {
                sink.lock().unwrap().push(info.percent);
                Ok(())
            })),
        };
        TracePlot::new()
            .render(sine_series(2), &TracePlotOptions::default(), &mut config)
            .unwrap();
        let percents = seen.lock().unwrap().clone();
        assert!(percents.contains(&100.0));
        assert!(percents.len() >= 3);
    }

    #[test]
    fn test_boxplot_renders_png() {
        let data = vec![
            ("ctrl".to_string(), (0..50).map(f64::from).collect()),
            ("drug".to_string(), (20..90).map(f64::from).collect()),
        ];
        let options = BoxPlotOptions::new()
            .y_lines(vec![("baseline".to_string(), 10.0)])
            .build()
            .unwrap();
        let bytes = BoxPlot::new()
            .render(data, &options, &mut RenderConfig::default())
            .unwrap();
        assert_eq!(&bytes[..8], &PNG_MAGIC);
    }

    #[test]
    fn test_boxplot_medians_only_variant() {
        let data = vec![("a".to_string(), vec![1.0, 2.0, 3.0, 4.0, 5.0])];
        let options = BoxPlotOptions::new()
            .medians_only(true)
            .show_outliers(false)
            .build()
            .unwrap();
        let bytes = BoxPlot::new()
            .render(data, &options, &mut RenderConfig::default())
            .unwrap();
        assert_eq!(&bytes[..8], &PNG_MAGIC);
    }

    #[test]
    fn test_scatter_column_same_seed_same_figure() {
        let data = vec![
            ("a".to_string(), (0..40).map(|i| f64::from(i) * 0.1).collect::<Vec<_>>()),
            ("b".to_string(), (0..40).map(|i| f64::from(i) * 0.2).collect::<Vec<_>>()),
        ];
        let options = ScatterColumnOptions::new().seed(42u64).build().unwrap();
        let first = ScatterColumnPlot::new()
            .render(data.clone(), &options, &mut RenderConfig::default())
            .unwrap();
        let second = ScatterColumnPlot::new()
            .render(data.clone(), &options, &mut RenderConfig::default())
            .unwrap();
        assert_eq!(first, second);

        // a different seed jitters differently
        let other_options = ScatterColumnOptions::new().seed(43u64).build().unwrap();
        let third = ScatterColumnPlot::new()
            .render(data, &other_options, &mut RenderConfig::default())
            .unwrap();
        assert_ne!(first, third);
    }

    #[test]
    fn test_raster_renders_png() {
        let data = vec![
            ("sweep001".to_string(), vec![0.1, 0.4, 0.9]),
            ("sweep002".to_string(), vec![0.2, 0.5]),
            ("sweep003".to_string(), vec![0.15, 0.45, 0.8, 0.95]),
        ];
        let options = RasterPlotOptions::new()
            .x_lines(vec![("stim".to_string(), 0.5)])
            .build()
            .unwrap();
        let bytes = RasterPlot::new()
            .render(data, &options, &mut RenderConfig::default())
            .unwrap();
        assert_eq!(&bytes[..8], &PNG_MAGIC);
    }

    // ============================================================================
    // Table bridges
    // ============================================================================

    fn epoched_frame() -> DataFrame {
        let mut sweep = Vec::new();
        let mut epoch = Vec::new();
        let mut time = Vec::new();
        let mut vm = Vec::new();
        for s in 1..=2 {
            for e in 1..=2 {
                for k in 0..5 {
                    sweep.push(format!("sweep{s:03}"));
                    epoch.push(format!("epoch{e:03}"));
                    time.push(k as f32 * 0.1);
                    vm.push((s * 10 + e) as f32 + k as f32);
                }
            }
        }
        DataFrame::new(vec![
            Column::new("sweep".into(), sweep),
            Column::new("epoch".into(), epoch),
            Column::new("time".into(), time),
            Column::new("Vm".into(), vm),
        ])
        .unwrap()
    }

    #[test]
    fn test_sweep_series_groups_by_sweep() {
        let series = sweep_series(&epoched_frame(), "Vm").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "sweep001");
        assert_eq!(series[0].points.len(), 10);
        assert_relative_eq!(series[1].points[0].1, 21.0);
    }

    #[test]
    fn test_stat_series_groups_by_sweep_and_epoch() {
        let series = stat_series(&epoched_frame(), "time", "Vm").unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series[0].label, "sweep001/epoch001");
        assert_eq!(series[3].label, "sweep002/epoch002");
        assert_eq!(series[2].points.len(), 5);
    }

    #[test]
    fn test_save_plot_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figure.png");
        let bytes = TracePlot::new()
            .render(
                sine_series(1),
                &TracePlotOptions::default(),
                &mut RenderConfig::default(),
            )
            .unwrap();
        save_plot(&bytes, &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }
}
