//! The windowing/epoching transform.
//!
//! Reindexes a multi-sweep time-series table into overlapping fixed-length
//! windows. Windows start every `step` rows and span `window` rows, so
//! consecutive windows share `window - step` rows when `step < window`, and
//! trailing rows that do not fill a whole window are dropped.

use crate::error::{EpochError, Result};
use ndarray::{Array2, Array3, s};
use polars::prelude::*;

/// Label for epoch `n` (1-based), e.g. `epoch001`
///
/// Zero-padded to three digits; widens naturally past 999.
#[must_use]
pub fn epoch_label(n: usize) -> String {
    format!("epoch{n:03}")
}

/// Number of complete windows that fit in `rows` samples
///
/// The truncation arithmetic at the heart of epoching:
/// `1 + (rows - window) / step`, integer division. A window equal to the
/// sweep yields exactly one epoch; a longer window is an error rather than
/// zero epochs.
///
/// # Errors
/// Will return `Err` if `window` or `step` is zero, or `window > rows`
pub fn epoch_count(rows: usize, window: usize, step: usize) -> Result<usize> {
    if window == 0 {
        return Err(EpochError::ZeroWindow);
    }
    if step == 0 {
        return Err(EpochError::ZeroStep);
    }
    if window > rows {
        return Err(EpochError::WindowExceedsSweep { window, rows });
    }
    Ok(1 + (rows - window) / step)
}

/// Window a `[rows, channels]` array into a `[epochs, window, channels]` array
///
/// Epoch `e` holds rows `e*step .. e*step + window` of the input; trailing
/// rows that do not fill a complete window are discarded.
///
/// # Errors
/// Will return `Err` if `window` or `step` is zero, or `window` exceeds the row count
pub fn step_window(array: &Array2<f64>, window: usize, step: usize) -> Result<Array3<f64>> {
    let (rows, channels) = array.dim();
    let n_epochs = epoch_count(rows, window, step)?;

    let mut out = Array3::<f64>::zeros((n_epochs, window, channels));
    for e in 0..n_epochs {
        let start = e * step;
        out.slice_mut(s![e, .., ..])
            .assign(&array.slice(s![start..start + window, ..]));
    }
    Ok(out)
}

/// Extract the named channels of a sweep table as a `[rows, channels]` array
///
/// Bridges the DataFrame form to the ndarray windowing path. Nulls become
/// NaN so row indices stay aligned with the table.
///
/// # Errors
/// Will return `Err` if a channel is missing or non-numeric
pub fn sweep_channel_matrix(df: &DataFrame, channels: &[&str]) -> Result<Array2<f64>> {
    let rows = df.height();
    let mut out = Array2::<f64>::zeros((rows, channels.len()));
    for (j, name) in channels.iter().enumerate() {
        let values = channel_f64(df, name)?;
        for (i, v) in values.into_iter().enumerate() {
            out[[i, j]] = v;
        }
    }
    Ok(out)
}

/// Window every sweep of a long table into labeled epochs
///
/// Groups the table by its `sweep` column (insertion order preserved), then
/// emits one `window`-row block per epoch per sweep with an added `epoch`
/// label column. Epoch counts are computed per sweep, so ragged sweep
/// lengths are tolerated; each sweep is truncated independently.
///
/// Output rows are ordered sweep-major, then epoch-major, then in-window,
/// with columns `[sweep, epoch, <original columns>]`. Overlapping windows
/// duplicate their shared rows, the same way the windowed array does.
///
/// # Errors
/// Will return `Err` if:
/// - `window` or `step` is zero
/// - any sweep is shorter than `window`
/// - the table has no `sweep` column
pub fn create_epochs(df: &DataFrame, window: usize, step: usize) -> Result<DataFrame> {
    if window == 0 {
        return Err(EpochError::ZeroWindow);
    }
    if step == 0 {
        return Err(EpochError::ZeroStep);
    }

    let sweeps = df.partition_by_stable(["sweep"], true)?;
    tracing::debug!(
        "Epoching {} sweeps with window {} step {}",
        sweeps.len(),
        window,
        step
    );
    let mut blocks: Vec<DataFrame> = Vec::new();
    for sweep in &sweeps {
        let n_epochs = epoch_count(sweep.height(), window, step)?;
        for e in 0..n_epochs {
            let mut block = sweep.slice((e * step) as i64, window);
            block.with_column(Column::new(
                "epoch".into(),
                vec![epoch_label(e + 1); window],
            ))?;
            blocks.push(block);
        }
    }

    let mut out = blocks
        .first()
        .cloned()
        .ok_or_else(|| EpochError::Stats("No sweeps in table".to_string()))?;
    for block in blocks.iter().skip(1) {
        out.vstack_mut(block)?;
    }

    // Put the index-like label columns first
    let mut order: Vec<String> = vec!["sweep".to_string(), "epoch".to_string()];
    order.extend(
        out.get_column_names()
            .iter()
            .map(ToString::to_string)
            .filter(|n| n != "sweep" && n != "epoch"),
    );
    Ok(out.select(order)?)
}

/// One channel of a table as f64, nulls mapped to NaN
///
/// # Errors
/// Will return `Err` if the channel is missing or non-numeric
pub(crate) fn channel_f64(df: &DataFrame, channel: &str) -> Result<Vec<f64>> {
    let series = df
        .column(channel)
        .map_err(|_| EpochError::ChannelNotFound(channel.to_string()))?;

    if let Ok(values) = series.f32() {
        Ok(values
            .into_iter()
            .map(|v| v.map_or(f64::NAN, f64::from))
            .collect())
    } else if let Ok(values) = series.f64() {
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else {
        Err(EpochError::Stats(format!(
            "Channel {} is not numeric (dtype: {:?})",
            channel,
            series.dtype()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn long_table(sweep_lens: &[usize]) -> DataFrame {
        let mut sweep = Vec::new();
        let mut value = Vec::new();
        for (s, &len) in sweep_lens.iter().enumerate() {
            for k in 0..len {
                sweep.push(format!("sweep{:03}", s + 1));
                value.push((s * 1000 + k) as f64);
            }
        }
        DataFrame::new(vec![
            Column::new("sweep".into(), sweep),
            Column::new("vm".into(), value),
        ])
        .unwrap()
    }

    #[test]
    fn test_epoch_count_truncates() {
        // 10 rows, window 4, step 3 → windows at 0, 3, 6; row 9 is dropped
        assert_eq!(epoch_count(10, 4, 3).unwrap(), 3);
        // exact fit
        assert_eq!(epoch_count(10, 10, 1).unwrap(), 1);
        // non-overlapping
        assert_eq!(epoch_count(10, 2, 2).unwrap(), 5);
    }

    #[test]
    fn test_epoch_count_rejects_degenerate_inputs() {
        assert!(matches!(epoch_count(10, 0, 1), Err(EpochError::ZeroWindow)));
        assert!(matches!(epoch_count(10, 2, 0), Err(EpochError::ZeroStep)));
        assert!(matches!(
            epoch_count(5, 6, 1),
            Err(EpochError::WindowExceedsSweep { window: 6, rows: 5 })
        ));
    }

    #[test]
    fn test_step_window_shapes_and_overlap() {
        let array =
            Array2::from_shape_fn((12, 2), |(i, j)| (i * 10 + j) as f64);
        let windows = step_window(&array, 4, 2).unwrap();
        assert_eq!(windows.shape(), &[5, 4, 2]);
        // epoch 1 starts at row 2, so it shares rows 2..4 with epoch 0
        assert_relative_eq!(windows[[1, 0, 0]], 20.0);
        assert_relative_eq!(windows[[0, 2, 0]], 20.0);
        // second column carries the channel offset
        assert_relative_eq!(windows[[4, 3, 1]], 111.0);
    }

    #[test]
    fn test_step_window_drops_trailing_rows() {
        let array = Array2::from_shape_fn((13, 1), |(i, _)| i as f64);
        let windows = step_window(&array, 5, 5).unwrap();
        assert_eq!(windows.shape()[0], 2);
        // rows 10..13 do not fill a window
        assert_relative_eq!(windows[[1, 4, 0]], 9.0);
    }

    #[test]
    fn test_create_epochs_labels_and_order() {
        let df = long_table(&[10, 10]);
        let epochs = create_epochs(&df, 4, 3).unwrap();

        // 3 epochs per sweep × 4 rows × 2 sweeps
        assert_eq!(epochs.height(), 24);
        assert_eq!(
            epochs.get_column_names()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["sweep", "epoch", "vm"]
        );

        let labels = epochs.column("epoch").unwrap().str().unwrap();
        assert_eq!(labels.get(0).unwrap(), "epoch001");
        assert_eq!(labels.get(4).unwrap(), "epoch002");

        // epoch002 of sweep001 starts at row 3 of that sweep
        let vm = epochs.column("vm").unwrap().f64().unwrap();
        assert_relative_eq!(vm.get(4).unwrap(), 3.0);
        // sweep002 blocks follow all of sweep001's
        let sweeps = epochs.column("sweep").unwrap().str().unwrap();
        assert_eq!(sweeps.get(12).unwrap(), "sweep002");
        assert_relative_eq!(vm.get(12).unwrap(), 1000.0);
    }

    #[test]
    fn test_create_epochs_tolerates_ragged_sweeps() {
        // second sweep is shorter and yields fewer epochs
        let df = long_table(&[10, 7]);
        let epochs = create_epochs(&df, 4, 3).unwrap();
        // 3 epochs from sweep001, 2 from sweep002
        assert_eq!(epochs.height(), (3 + 2) * 4);
    }

    #[test]
    fn test_create_epochs_window_too_large() {
        let df = long_table(&[5]);
        assert!(matches!(
            create_epochs(&df, 6, 1),
            Err(EpochError::WindowExceedsSweep { .. })
        ));
    }

    #[test]
    fn test_sweep_channel_matrix_bridges_to_ndarray() {
        let df = long_table(&[6]);
        let matrix = sweep_channel_matrix(&df, &["vm"]).unwrap();
        assert_eq!(matrix.dim(), (6, 1));
        assert_relative_eq!(matrix[[5, 0]], 5.0);
        assert!(sweep_channel_matrix(&df, &["missing"]).is_err());
    }
}
