use anyhow::Result;
use clap::Parser;
use dialoguer::Confirm;
use ephys_abf::Abf;
use ephys_epochs::{
    Bandwidth, create_epochs, epoch_density, epoch_histogram, epoch_periodogram,
};
use ephys_plots::plots::Plot;
use ephys_plots::{
    FrameStyle, TracePlot, TracePlotOptions, get_percentile_bounds, save_plot, stat_series,
    trace_options_from_abf,
};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::DataFrame;
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// ephys - batch epoching and analysis of ABF recordings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "ephys")]
#[command(about = "Window ABF sweeps into epochs and summarize each one", long_about = None)]
struct Cli {
    /// Path(s) to input ABF file(s) or directory containing ABF files
    /// Can specify multiple files or a directory
    #[arg(value_name = "INPUT_FILES")]
    input: Vec<PathBuf>,

    /// Output directory for stat tables and reports (optional)
    /// If not specified, outputs are saved alongside input files
    #[arg(short, long, value_name = "OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Channel to analyze (defaults to the first recorded channel)
    #[arg(short, long)]
    channel: Option<String>,

    /// Epoch window length in samples
    #[arg(short, long, default_value = "2000")]
    window: usize,

    /// Start-to-start distance between epochs in samples
    /// (defaults to the window length, i.e. non-overlapping epochs)
    #[arg(short, long)]
    step: Option<usize>,

    /// Statistics to compute per epoch (comma-separated)
    #[arg(long, value_delimiter = ',', default_values = ["hist", "kde", "pgram"])]
    stats: Vec<StatArg>,

    /// Value range for histograms and KDEs as "min,max"
    /// (defaults to the 1st..99th percentile of the channel, nice-rounded)
    #[arg(long, value_delimiter = ',', num_args = 2, allow_hyphen_values = true)]
    range: Option<Vec<f64>>,

    /// Number of histogram bins
    #[arg(long, default_value = "50")]
    bins: usize,

    /// KDE grid resolution (defaults to five points per data unit)
    #[arg(long)]
    resolution: Option<usize>,

    /// KDE bandwidth selection rule
    #[arg(long, value_enum, default_value = "scott")]
    bandwidth: BandwidthArg,

    /// Sampling rate override in Hz for the periodogram
    /// (defaults to the rate recorded in the file)
    #[arg(long)]
    fs: Option<f64>,

    /// Export per-epoch stat tables as CSV
    #[arg(long)]
    export_csv: bool,

    /// Export a JSON summary of each file (header, protocol, channels)
    #[arg(long)]
    export_json: bool,

    /// Save a JSON processing report
    #[arg(long, value_name = "REPORT_PATH")]
    report: Option<PathBuf>,

    /// Generate figures after processing (if not specified, will prompt interactively)
    #[arg(long)]
    plots: Option<bool>,

    /// Directory to save figures (defaults to the output directory)
    #[arg(long, value_name = "PLOT_DIR")]
    plot_dir: Option<PathBuf>,

    /// Chart furniture for the sweep trace figure
    #[arg(long, value_enum, default_value = "simple")]
    trace_style: FrameStyleArg,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum StatArg {
    /// Per-epoch histograms
    Hist,
    /// Per-epoch kernel density estimates
    Kde,
    /// Per-epoch periodograms
    Pgram,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum BandwidthArg {
    Scott,
    Silverman,
}

impl From<BandwidthArg> for Bandwidth {
    fn from(arg: BandwidthArg) -> Self {
        match arg {
            BandwidthArg::Scott => Bandwidth::Scott,
            BandwidthArg::Silverman => Bandwidth::Silverman,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum FrameStyleArg {
    Full,
    Simple,
    Clean,
}

impl From<FrameStyleArg> for FrameStyle {
    fn from(arg: FrameStyleArg) -> Self {
        match arg {
            FrameStyleArg::Full => FrameStyle::Full,
            FrameStyleArg::Simple => FrameStyle::Simple,
            FrameStyleArg::Clean => FrameStyle::Clean,
        }
    }
}

/// Everything a worker needs to process one file
#[derive(Clone)]
struct ProcessingConfig {
    channel: Option<String>,
    window: usize,
    step: usize,
    stats: Vec<StatArg>,
    range: Option<(f64, f64)>,
    bins: usize,
    resolution: Option<usize>,
    bandwidth: Bandwidth,
    fs: Option<f64>,
    export_csv: bool,
    export_json: bool,
    generate_plots: bool,
    trace_style: FrameStyle,
    output_dir: Option<PathBuf>,
    plot_dir: Option<PathBuf>,
}

/// Result of processing a single file
#[derive(Debug, Serialize)]
struct FileResult {
    filename: String,
    channel: String,
    n_sweeps: usize,
    n_epochs: usize,
    sampling_rate_hz: f64,
    stats_written: Vec<String>,
    plots_written: Vec<String>,
    processing_time_ms: u128,
    error: Option<String>,
}

#[derive(Serialize)]
struct Report<'a> {
    window: usize,
    step: usize,
    bandwidth: Bandwidth,
    files: &'a [FileResult],
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let files = collect_input_files(&cli.input)?;
    if files.is_empty() {
        return Err(anyhow::anyhow!(
            "No ABF files found in the given input paths"
        ));
    }
    info!("Found {} ABF file(s)", files.len());

    if let Some(dir) = &cli.output {
        std::fs::create_dir_all(dir)?;
    }

    // Resolve plot generation up front so workers stay non-interactive
    let generate_plots = match cli.plots {
        Some(flag) => flag,
        None => Confirm::new()
            .with_prompt("Generate figures for each file?")
            .default(false)
            .interact()
            .unwrap_or(false),
    };
    let plot_dir = cli.plot_dir.clone().or_else(|| cli.output.clone());
    if generate_plots {
        if let Some(dir) = &plot_dir {
            std::fs::create_dir_all(dir)?;
        }
    }

    let range = cli.range.as_ref().map(|r| (r[0], r[1]));
    if let Some((low, high)) = range {
        if low >= high {
            return Err(anyhow::anyhow!("--range min must be below max"));
        }
    }

    let config = ProcessingConfig {
        channel: cli.channel.clone(),
        window: cli.window,
        step: cli.step.unwrap_or(cli.window),
        stats: cli.stats.clone(),
        range,
        bins: cli.bins,
        resolution: cli.resolution,
        bandwidth: cli.bandwidth.into(),
        fs: cli.fs,
        export_csv: cli.export_csv,
        export_json: cli.export_json,
        generate_plots,
        trace_style: cli.trace_style.into(),
        output_dir: cli.output.clone(),
        plot_dir,
    };

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?
        .progress_chars("##-"),
    );

    let results: Vec<FileResult> = files
        .par_iter()
        .map(|path| {
            let result = process_single_file(path, &config);
            progress.inc(1);
            result
        })
        .collect();
    progress.finish_and_clear();

    print_summary(&results);

    if let Some(report_path) = &cli.report {
        let report = Report {
            window: config.window,
            step: config.step,
            bandwidth: config.bandwidth,
            files: &results,
        };
        std::fs::write(report_path, serde_json::to_string_pretty(&report)?)?;
        info!("Report saved to {}", report_path.display());
    }

    let failures = results.iter().filter(|r| r.error.is_some()).count();
    if failures > 0 {
        warn!("{} of {} files failed", failures, results.len());
        std::process::exit(1);
    }
    Ok(())
}

/// Collect all ABF files from input paths (handles files and directories)
fn collect_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            if input
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("abf"))
            {
                files.push(input.clone());
            }
        } else if input.is_dir() {
            for entry in walkdir::WalkDir::new(input).into_iter() {
                let entry = entry?;
                let path = entry.path();
                if path.is_file()
                    && path
                        .extension()
                        .and_then(|s| s.to_str())
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("abf"))
                {
                    files.push(path.to_path_buf());
                }
            }
        } else {
            return Err(anyhow::anyhow!("Path does not exist: {}", input.display()));
        }
    }

    Ok(files)
}

/// Process a single ABF file, capturing any failure in the result
fn process_single_file(input_path: &Path, config: &ProcessingConfig) -> FileResult {
    let start_time = Instant::now();
    let filename = input_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    match process_file_internal(input_path, config) {
        Ok(mut result) => {
            result.filename = filename;
            result.processing_time_ms = start_time.elapsed().as_millis();
            result
        }
        Err(e) => FileResult {
            filename,
            channel: String::new(),
            n_sweeps: 0,
            n_epochs: 0,
            sampling_rate_hz: 0.0,
            stats_written: Vec::new(),
            plots_written: Vec::new(),
            processing_time_ms: start_time.elapsed().as_millis(),
            error: Some(e.to_string()),
        },
    }
}

fn process_file_internal(input_path: &Path, config: &ProcessingConfig) -> Result<FileResult> {
    let abf = Abf::open(input_path)?;
    let channel = match &config.channel {
        Some(name) => name.clone(),
        None => abf
            .channel_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("File has no channels"))?,
    };
    debug!(
        "{}: {} sweeps, analyzing channel {:?}",
        input_path.display(),
        abf.n_sweeps(),
        channel
    );

    let epochs = create_epochs(&abf.data_frame, config.window, config.step)?;
    let n_epochs = epochs.height() / config.window;

    // Shared value range for histograms and KDEs
    let (range_min, range_max) = match config.range {
        Some(range) => range,
        None => {
            let values = abf.get_channel_f64(&channel)?;
            let bounds = get_percentile_bounds(&values, 0.01, 0.99);
            (*bounds.start(), *bounds.end())
        }
    };
    let fs = config.fs.unwrap_or_else(|| abf.sampling_rate());

    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string();
    let out_dir = config
        .output_dir
        .clone()
        .or_else(|| input_path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut stats_written = Vec::new();
    let mut plots_written = Vec::new();

    if config.export_json {
        let json_path = out_dir.join(format!("{stem}_info.json"));
        std::fs::write(&json_path, abf.info_json()?)?;
        stats_written.push(json_path.display().to_string());
    }

    for stat in &config.stats {
        let (table, x_name, y_name, suffix) = match stat {
            StatArg::Hist => (
                epoch_histogram(&epochs, &channel, range_min, range_max, config.bins)?,
                "bin",
                "count",
                "hist",
            ),
            StatArg::Kde => (
                epoch_density(
                    &epochs,
                    &channel,
                    range_min,
                    range_max,
                    config.resolution,
                    config.bandwidth,
                )?,
                "x",
                "density",
                "kde",
            ),
            StatArg::Pgram => (
                epoch_periodogram(&epochs, &channel, fs)?,
                "frequency",
                "power",
                "pgram",
            ),
        };

        if config.export_csv {
            let csv_path = out_dir.join(format!("{stem}_{suffix}.csv"));
            write_stat_csv(&table, x_name, y_name, &csv_path)?;
            stats_written.push(csv_path.display().to_string());
        } else {
            stats_written.push(format!("{suffix} ({} rows)", table.height()));
        }

        if config.generate_plots {
            if let Some(dir) = &config.plot_dir {
                let series = stat_series(&table, x_name, y_name)?;
                let options = TracePlotOptions::new()
                    .x_axis(
                        ephys_plots::AxisOptions::new()
                            .label(x_name.to_string())
                            .build()?,
                    )
                    .y_axis(
                        ephys_plots::AxisOptions::new()
                            .label(y_name.to_string())
                            .build()?,
                    )
                    .build()?;
                let bytes =
                    TracePlot::new().render(series, &options, &mut Default::default())?;
                let plot_path = dir.join(format!("{stem}_{suffix}.png"));
                save_plot(&bytes, &plot_path)?;
                plots_written.push(plot_path.display().to_string());
            }
        }
    }

    if config.generate_plots {
        if let Some(dir) = &config.plot_dir {
            let (series, mut options) = trace_options_from_abf(&abf, &channel)?;
            options.frame = config.trace_style;
            let bytes = TracePlot::new().render(series, &options, &mut Default::default())?;
            let plot_path = dir.join(format!("{stem}_trace.png"));
            save_plot(&bytes, &plot_path)?;
            plots_written.push(plot_path.display().to_string());
        }
    }

    Ok(FileResult {
        filename: String::new(), // filled by the caller
        channel,
        n_sweeps: abf.n_sweeps(),
        n_epochs,
        sampling_rate_hz: abf.sampling_rate(),
        stats_written,
        plots_written,
        processing_time_ms: 0, // filled by the caller
        error: None,
    })
}

/// Write a per-epoch stat table as CSV: sweep,epoch,<x>,<y>
fn write_stat_csv(table: &DataFrame, x_name: &str, y_name: &str, path: &Path) -> Result<()> {
    let sweeps = table.column("sweep")?.str()?;
    let epochs = table.column("epoch")?.str()?;
    let xs = table.column(x_name)?.f64()?;
    let ys = table.column(y_name)?.f64()?;

    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    writeln!(writer, "sweep,epoch,{x_name},{y_name}")?;
    for row in 0..table.height() {
        writeln!(
            writer,
            "{},{},{},{}",
            sweeps.get(row).unwrap_or(""),
            epochs.get(row).unwrap_or(""),
            xs.get(row).unwrap_or(f64::NAN),
            ys.get(row).unwrap_or(f64::NAN),
        )?;
    }
    Ok(())
}

fn print_summary(results: &[FileResult]) {
    println!();
    println!(
        "{:<28} {:>7} {:>7} {:>10} {:>9}  status",
        "file", "sweeps", "epochs", "rate (Hz)", "time (ms)"
    );
    for result in results {
        match &result.error {
            Some(error) => println!(
                "{:<28} {:>7} {:>7} {:>10} {:>9}  FAILED: {}",
                result.filename, "-", "-", "-", result.processing_time_ms, error
            ),
            None => println!(
                "{:<28} {:>7} {:>7} {:>10.1} {:>9}  ok",
                result.filename,
                result.n_sweeps,
                result.n_epochs,
                result.sampling_rate_hz,
                result.processing_time_ms
            ),
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use ephys_abf::{AbfWriteSpec, write_abf1_file};

    fn write_test_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let sweeps = (0..2)
            .map(|_| {
                vec![
                    (0..4000)
                        .map(|k| -0.05 + 0.004 * ((k as f32) * 0.02).sin())
                        .collect(),
                ]
            })
            .collect();
        let mut spec =
            AbfWriteSpec::new(sweeps, vec!["Vm".to_string()], vec!["V".to_string()]);
        spec.adc_range = 1.0;
        let path = dir.path().join(name);
        write_abf1_file(&path, &spec).unwrap();
        path
    }

    fn test_config(dir: &tempfile::TempDir) -> ProcessingConfig {
        ProcessingConfig {
            channel: None,
            window: 2000,
            step: 1000,
            stats: vec![StatArg::Hist, StatArg::Kde, StatArg::Pgram],
            range: Some((-0.06, -0.04)),
            bins: 20,
            resolution: Some(64),
            bandwidth: Bandwidth::Scott,
            fs: None,
            export_csv: true,
            export_json: true,
            generate_plots: true,
            trace_style: FrameStyle::Simple,
            output_dir: Some(dir.path().join("out")),
            plot_dir: Some(dir.path().join("plots")),
        }
    }

    #[test]
    fn test_collect_input_files_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        write_test_file(&dir, "a.abf");
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = collect_input_files(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files.len(), 1);
        assert!(collect_input_files(&[dir.path().join("missing")]).is_err());
    }

    #[test]
    fn test_process_single_file_writes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_file(&dir, "cell.abf");
        let config = test_config(&dir);
        std::fs::create_dir_all(config.output_dir.as_ref().unwrap()).unwrap();
        std::fs::create_dir_all(config.plot_dir.as_ref().unwrap()).unwrap();

        let result = process_single_file(&path, &config);
        assert!(result.error.is_none(), "{:?}", result.error);
        assert_eq!(result.n_sweeps, 2);
        // 1 + (4000 - 2000) / 1000 epochs per sweep, 2 sweeps
        assert_eq!(result.n_epochs, 6);
        // the file-info JSON plus one CSV per stat
        assert_eq!(result.stats_written.len(), 4);
        // one figure per stat plus the sweep trace
        assert_eq!(result.plots_written.len(), 4);
        for written in &result.stats_written {
            assert!(Path::new(written).exists(), "missing {written}");
        }

        // spot-check one CSV header
        let hist_csv = std::fs::read_to_string(
            config.output_dir.as_ref().unwrap().join("cell_hist.csv"),
        )
        .unwrap();
        assert!(hist_csv.starts_with("sweep,epoch,bin,count"));
        assert!(hist_csv.lines().count() > 1 + 6 * 20 - 1);
    }

    #[test]
    fn test_process_single_file_reports_open_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.abf");
        std::fs::write(&path, b"not an abf").unwrap();

        let result = process_single_file(&path, &test_config(&dir));
        assert!(result.error.is_some());
    }
}
