use crate::error::{EpochError, Result};
use crate::stats::{epoch_groups, stat_frame};
use polars::prelude::DataFrame;
use realfft::RealFftPlanner;

/// A one-sided power spectral density estimate
///
/// Classic rectangular-window periodogram: constant detrend (mean removal),
/// `P[k] = |X[k]|² / (fs·N)`, doubled at every bin except DC and (for even
/// `N`) Nyquist so the one-sided spectrum conserves power. `N/2 + 1`
/// frequency bins at `k·fs/N` Hz.
pub struct Periodogram {
    /// Frequency bins in Hz
    pub frequency: Vec<f64>,
    /// Power spectral density in units²/Hz
    pub power: Vec<f64>,
}

impl Periodogram {
    /// Estimate the PSD of one window sampled at `fs` Hz
    ///
    /// # Errors
    /// Will return `Err` if the window is shorter than 2 samples, `fs` is
    /// not positive, or any sample is non-finite (a NaN would silently
    /// poison the whole spectrum)
    pub fn estimate(data: &[f64], fs: f64) -> Result<Self> {
        let n = data.len();
        if n < 2 {
            return Err(EpochError::InsufficientData { min: 2, actual: n });
        }
        if !(fs.is_finite() && fs > 0.0) {
            return Err(EpochError::Stats(format!("Invalid sampling rate: {fs}")));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(EpochError::Stats(
                "Periodogram input contains non-finite samples".to_string(),
            ));
        }

        // Constant detrend
        let mean = data.iter().sum::<f64>() / n as f64;
        let mut input: Vec<f64> = data.iter().map(|&v| v - mean).collect();

        let plan = RealFftPlanner::<f64>::new().plan_fft_forward(n);
        let mut spectrum = plan.make_output_vec();
        plan.process(&mut input, &mut spectrum)
            .map_err(|e| EpochError::Stats(format!("FFT failed: {e}")))?;

        let scale = 1.0 / (fs * n as f64);
        let has_nyquist_bin = n % 2 == 0;
        let last = spectrum.len() - 1;
        let power: Vec<f64> = spectrum
            .iter()
            .enumerate()
            .map(|(k, x)| {
                let mut p = x.norm_sqr() * scale;
                if k != 0 && !(has_nyquist_bin && k == last) {
                    p *= 2.0;
                }
                p
            })
            .collect();

        let frequency = (0..power.len()).map(|k| k as f64 * fs / n as f64).collect();
        Ok(Self { frequency, power })
    }

    /// Frequency of the strongest non-DC component
    #[must_use]
    pub fn peak_frequency(&self) -> Option<f64> {
        self.power
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(k, _)| self.frequency[k])
    }
}

/// Per-epoch periodograms of one channel of an epoched table
///
/// Returns a long table `[sweep, epoch, frequency, power]` with
/// `window/2 + 1` rows per epoch.
///
/// # Errors
/// Will return `Err` if the channel is missing, `fs` is invalid, or any
/// epoch contains non-finite samples
pub fn epoch_periodogram(
    epoch_df: &DataFrame,
    channel: &str,
    fs: f64,
) -> Result<DataFrame> {
    let mut rows = Vec::new();
    for (sweep, epoch, values) in epoch_groups(epoch_df, channel)? {
        let periodogram = Periodogram::estimate(&values, fs)?;
        rows.push((sweep, epoch, periodogram.frequency, periodogram.power));
    }
    stat_frame(rows, "frequency", "power")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_periodogram_bin_layout() {
        let data: Vec<f64> = (0..256).map(|i| (i as f64 * 0.1).sin()).collect();
        let psd = Periodogram::estimate(&data, 1000.0).unwrap();
        assert_eq!(psd.frequency.len(), 129);
        assert_relative_eq!(psd.frequency[0], 0.0);
        // bin spacing is fs/N
        assert_relative_eq!(psd.frequency[1], 1000.0 / 256.0);
        // last bin is Nyquist for even N
        assert_relative_eq!(psd.frequency[128], 500.0);
    }

    #[test]
    fn test_periodogram_locates_a_pure_tone() {
        // 40 Hz tone sampled at 1 kHz for 1 s lands exactly on bin 40
        let fs = 1000.0;
        let data: Vec<f64> = (0..1000)
            .map(|i| (2.0 * std::f64::consts::PI * 40.0 * i as f64 / fs).sin())
            .collect();
        let psd = Periodogram::estimate(&data, fs).unwrap();
        assert_relative_eq!(psd.peak_frequency().unwrap(), 40.0);
    }

    #[test]
    fn test_periodogram_conserves_tone_power() {
        // one-sided PSD of a unit sine integrates to its variance (1/2)
        let fs = 500.0;
        let data: Vec<f64> = (0..500)
            .map(|i| (2.0 * std::f64::consts::PI * 25.0 * i as f64 / fs).sin())
            .collect();
        let psd = Periodogram::estimate(&data, fs).unwrap();
        let df = fs / 500.0;
        let total: f64 = psd.power.iter().sum::<f64>() * df;
        assert_relative_eq!(total, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_periodogram_detrends_dc() {
        let data = vec![5.0; 128];
        let psd = Periodogram::estimate(&data, 100.0).unwrap();
        // constant signal has no power anywhere after mean removal
        assert!(psd.power.iter().all(|&p| p.abs() < 1e-18));
    }

    #[test]
    fn test_periodogram_rejects_bad_input() {
        assert!(Periodogram::estimate(&[1.0], 100.0).is_err());
        assert!(Periodogram::estimate(&[1.0, 2.0, f64::NAN], 100.0).is_err());
        assert!(Periodogram::estimate(&[1.0, 2.0, 3.0], 0.0).is_err());
    }
}
