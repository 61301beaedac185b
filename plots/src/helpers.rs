//! Bridges from sweep/stat tables to plot data.

use crate::options::{AxisOptions, TracePlotOptions};
use crate::plots::TraceSeries;
use anyhow::{Context, Result, anyhow};
use ephys_abf::Abf;
use polars::prelude::*;
use std::path::Path;

/// One trace series per sweep of a long sweep table
///
/// Expects `sweep` and `time` columns plus the named channel, the shape
/// `Abf::open` and `create_epochs` produce.
///
/// # Errors
/// Will return `Err` if a required column is missing or non-numeric
pub fn sweep_series(df: &DataFrame, channel: &str) -> Result<Vec<TraceSeries>> {
    let parts = df.partition_by_stable(["sweep"], true)?;
    let mut series = Vec::with_capacity(parts.len());
    for part in parts {
        let label = first_label(&part, "sweep")?;
        let x = column_f64(&part, "time")?;
        let y = column_f64(&part, channel)?;
        series.push(TraceSeries {
            label,
            points: x.into_iter().zip(y).collect(),
        });
    }
    Ok(series)
}

/// One trace series per epoch of a per-epoch stat table
///
/// Works on the `[sweep, epoch, <x>, <y>]` frames the stat functions
/// return; series are labeled `sweep001/epoch001`.
///
/// # Errors
/// Will return `Err` if a required column is missing or non-numeric
pub fn stat_series(df: &DataFrame, x_column: &str, y_column: &str) -> Result<Vec<TraceSeries>> {
    let parts = df.partition_by_stable(["sweep", "epoch"], true)?;
    let mut series = Vec::with_capacity(parts.len());
    for part in parts {
        let sweep = first_label(&part, "sweep")?;
        let epoch = first_label(&part, "epoch")?;
        let x = column_f64(&part, x_column)?;
        let y = column_f64(&part, y_column)?;
        series.push(TraceSeries {
            label: format!("{sweep}/{epoch}"),
            points: x.into_iter().zip(y).collect(),
        });
    }
    Ok(series)
}

/// Trace data and labeled options straight from an open recording
///
/// Pulls every sweep of `channel` and pre-fills the axis labels from the
/// channel units (e.g. `Vm (mV)` over `time (s)`).
///
/// # Errors
/// Will return `Err` if the channel does not exist in the recording
pub fn trace_options_from_abf(
    abf: &Abf,
    channel: &str,
) -> Result<(Vec<TraceSeries>, TracePlotOptions)> {
    let data = sweep_series(&abf.data_frame, channel)?;
    let units = abf
        .channel_map()
        .get(channel)
        .map(|c| c.units.to_string())
        .ok_or_else(|| anyhow!("Channel not found in ABF file: {}", channel))?;

    let y_label = if units.is_empty() {
        channel.to_string()
    } else {
        format!("{channel} ({units})")
    };
    let options = TracePlotOptions::new()
        .x_axis(AxisOptions::new().label("time (s)").build()?)
        .y_axis(AxisOptions::new().label(y_label).build()?)
        .build()?;
    Ok((data, options))
}

/// Write encoded plot bytes to disk
///
/// # Errors
/// Will return `Err` if the file cannot be written
pub fn save_plot(bytes: &[u8], path: &Path) -> Result<()> {
    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write plot to {}", path.display()))
}

fn first_label(df: &DataFrame, column: &str) -> Result<String> {
    df.column(column)?
        .str()?
        .get(0)
        .map(ToString::to_string)
        .ok_or_else(|| anyhow!("Empty {column} group"))
}

fn column_f64(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let series = df
        .column(column)
        .map_err(|_| anyhow!("Column not found: {}", column))?;
    if let Ok(values) = series.f32() {
        Ok(values
            .into_iter()
            .map(|v| v.map_or(f64::NAN, f64::from))
            .collect())
    } else if let Ok(values) = series.f64() {
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else {
        Err(anyhow!(
            "Column {} is not numeric (dtype: {:?})",
            column,
            series.dtype()
        ))
    }
}
