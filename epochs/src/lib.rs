//! Sweep windowing/epoching and per-epoch statistics
//!
//! This crate implements the epoching transform at the heart of the
//! toolkit: a long multi-sweep table goes in, overlapping fixed-length
//! labeled windows come out, and each window can be summarized with a
//! histogram, kernel density estimate, or periodogram on a shared grid.
//!
//! # Quick Start
//!
//! ```no_run
//! use ephys_abf::Abf;
//! use ephys_epochs::{Bandwidth, create_epochs, epoch_density};
//!
//! let abf = Abf::open("data/cell01.abf".as_ref())?;
//!
//! // 2000-sample windows starting every 500 samples (75% overlap)
//! let epochs = create_epochs(&abf.data_frame, 2000, 500)?;
//!
//! let kde = epoch_density(&epochs, "Vm", -80.0, -20.0, None, Bandwidth::default())?;
//! println!("{} density rows", kde.height());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The array path (`step_window`) mirrors the table path for callers that
//! want `[epochs, window, channels]` ndarray blocks instead of labels.

pub mod error;
pub mod stats;
pub mod window;

pub use error::{EpochError, Result};
pub use stats::{
    Bandwidth, Histogram, KernelDensity, Periodogram,
    density::{default_resolution, epoch_density},
    histogram::epoch_histogram,
    periodogram::epoch_periodogram,
};
pub use window::{create_epochs, epoch_count, epoch_label, step_window, sweep_channel_matrix};

use polars::prelude::DataFrame;

/// Trait for recordings that can be epoched
///
/// Implement this on a data source to run the epoching pipeline over it.
/// The `abf` feature (on by default) implements it for `ephys_abf::Abf`.
pub trait SweepSource {
    /// The long sweep table: a `sweep` label column plus data columns
    fn sweep_table(&self) -> &DataFrame;

    /// Per-channel sampling rate in Hz
    fn sampling_rate(&self) -> f64;

    /// Data channels available for analysis
    fn channel_names(&self) -> Vec<String>;
}

/// Window every sweep of a source into labeled epochs
///
/// Convenience wrapper over [`create_epochs`] for [`SweepSource`] types.
///
/// # Errors
/// Will return `Err` under the same conditions as [`create_epochs`]
pub fn epoch_source(source: &impl SweepSource, window: usize, step: usize) -> Result<DataFrame> {
    create_epochs(source.sweep_table(), window, step)
}

#[cfg(feature = "abf")]
mod abf_impl {
    use super::SweepSource;
    use ephys_abf::Abf;
    use polars::prelude::DataFrame;

    impl SweepSource for Abf {
        fn sweep_table(&self) -> &DataFrame {
            &self.data_frame
        }

        fn sampling_rate(&self) -> f64 {
            Abf::sampling_rate(self)
        }

        fn channel_names(&self) -> Vec<String> {
            Abf::channel_names(self)
        }
    }
}
