pub mod density;
pub mod histogram;
pub mod periodogram;

pub use density::{Bandwidth, KernelDensity};
pub use histogram::Histogram;
pub use periodogram::Periodogram;

use crate::error::{EpochError, Result};
use crate::window::channel_f64;
use polars::prelude::*;

/// Split an epoched table into `(sweep, epoch, values)` groups in order
///
/// The groups come back sweep-major then epoch-major, matching the row
/// order `create_epochs` produces.
pub(crate) fn epoch_groups(
    epoch_df: &DataFrame,
    channel: &str,
) -> Result<Vec<(String, String, Vec<f64>)>> {
    if epoch_df.column(channel).is_err() {
        return Err(EpochError::ChannelNotFound(channel.to_string()));
    }
    let parts = epoch_df.partition_by_stable(["sweep", "epoch"], true)?;
    let mut groups = Vec::with_capacity(parts.len());
    for part in parts {
        let sweep = label(&part, "sweep")?;
        let epoch = label(&part, "epoch")?;
        groups.push((sweep, epoch, channel_f64(&part, channel)?));
    }
    Ok(groups)
}

fn label(part: &DataFrame, column: &str) -> Result<String> {
    part.column(column)?
        .str()?
        .get(0)
        .map(ToString::to_string)
        .ok_or_else(|| EpochError::Stats(format!("Empty {column} label group")))
}

/// Assemble a per-epoch stat table: `[sweep, epoch, <x_name>, <y_name>]`
pub(crate) fn stat_frame(
    rows: Vec<(String, String, Vec<f64>, Vec<f64>)>,
    x_name: &str,
    y_name: &str,
) -> Result<DataFrame> {
    let mut sweeps = Vec::new();
    let mut epochs = Vec::new();
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (sweep, epoch, x, y) in rows {
        debug_assert_eq!(x.len(), y.len());
        sweeps.extend(std::iter::repeat_n(sweep, x.len()));
        epochs.extend(std::iter::repeat_n(epoch, x.len()));
        xs.extend(x);
        ys.extend(y);
    }
    Ok(DataFrame::new(vec![
        Column::new("sweep".into(), sweeps),
        Column::new("epoch".into(), epochs),
        Column::new(x_name.into(), xs),
        Column::new(y_name.into(), ys),
    ])?)
}
