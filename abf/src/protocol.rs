use super::header::{
    Header, V1_ADC_NUM_CHANNELS, V1_ADC_RANGE, V1_ADC_RESOLUTION, V1_ADC_SAMPLE_INTERVAL,
    V1_OPERATION_MODE, V1_SAMPLES_PER_EPISODE, read_f32, read_i16, read_i32,
};
use super::section::SectionMap;
use anyhow::{Result, anyhow};
use memmap3::Mmap;
use serde::Serialize;
use strum_macros::Display;

// ABF2 ProtocolSection entry layout (byte offsets within the section)
const V2_OPERATION_MODE: usize = 0; // nOperationMode, i16
const V2_ADC_SEQUENCE_INTERVAL: usize = 2; // fADCSequenceInterval, f32 (µs, multiplexed)
const V2_SAMPLES_PER_EPISODE: usize = 22; // lNumSamplesPerEpisode, i32 (multiplexed)
const V2_ADC_RANGE: usize = 110; // fADCRange, f32
const V2_ADC_RESOLUTION: usize = 118; // lADCResolution, i32

/// Acquisition mode of the recording (`nOperationMode`)
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationMode {
    /// Event-driven, variable-length sweeps
    VariableLength,
    /// Event-driven, fixed-length sweeps
    FixedLength,
    /// Continuous gap-free recording (treated as one sweep)
    GapFree,
    /// High-speed oscilloscope mode
    Oscilloscope,
    /// Episodic stimulation (waveform) mode
    Episodic,
}

impl OperationMode {
    /// Matches the `nOperationMode` header value
    /// # Errors
    /// Will return `Err` for codes outside 1..=5
    pub fn from_mode_code(code: i16) -> Result<Self> {
        match code {
            1 => Ok(Self::VariableLength),
            2 => Ok(Self::FixedLength),
            3 => Ok(Self::GapFree),
            4 => Ok(Self::Oscilloscope),
            5 => Ok(Self::Episodic),
            _ => Err(anyhow!("Invalid nOperationMode code: {}", code)),
        }
    }

    /// The `nOperationMode` header value for this mode
    #[must_use]
    pub const fn mode_code(&self) -> i16 {
        match self {
            Self::VariableLength => 1,
            Self::FixedLength => 2,
            Self::GapFree => 3,
            Self::Oscilloscope => 4,
            Self::Episodic => 5,
        }
    }
}

/// Version-independent view of the acquisition settings
///
/// ABF1 keeps these fields at fixed offsets in the file header; ABF2 moves
/// them into the ProtocolSection. Either way the analysis code only ever
/// sees this struct.
#[derive(Clone, Debug, Serialize)]
pub struct AcquisitionProtocol {
    pub operation_mode: OperationMode,
    /// Interval between samples of the multiplexed ADC, in microseconds
    pub adc_sequence_interval_us: f32,
    /// Number of recorded input channels
    pub n_channels: usize,
    /// Multiplexed samples per sweep (all channels interleaved)
    pub samples_per_sweep: usize,
    /// Number of sweeps in the record
    pub sweep_count: usize,
    /// Full-scale ADC input range in volts (`fADCRange`)
    pub adc_range: f32,
    /// ADC resolution in counts (`lADCResolution`)
    pub adc_resolution: i32,
}

impl AcquisitionProtocol {
    /// Read the protocol from an ABF1 header block
    /// # Errors
    /// Will return `Err` if a field is out of range or the header is truncated
    pub fn from_v1_mmap(mmap: &Mmap, header: &Header) -> Result<Self> {
        let operation_mode = OperationMode::from_mode_code(read_i16(mmap, V1_OPERATION_MODE)?)?;
        let n_channels = read_i16(mmap, V1_ADC_NUM_CHANNELS)?;
        let samples_per_sweep = read_i32(mmap, V1_SAMPLES_PER_EPISODE)?;

        Self::assemble(
            operation_mode,
            read_f32(mmap, V1_ADC_SAMPLE_INTERVAL)?,
            n_channels,
            samples_per_sweep,
            read_f32(mmap, V1_ADC_RANGE)?,
            read_i32(mmap, V1_ADC_RESOLUTION)?,
            header,
        )
    }

    /// Read the protocol from an ABF2 ProtocolSection
    /// # Errors
    /// Will return `Err` if the section is missing, truncated, or a field is out of range
    pub fn from_v2_mmap(mmap: &Mmap, sections: &SectionMap, header: &Header) -> Result<Self> {
        let protocol = &sections.protocol;
        if protocol.is_empty() {
            return Err(anyhow!("ABF2 file has no ProtocolSection"));
        }
        let base = protocol.byte_start();
        let operation_mode =
            OperationMode::from_mode_code(read_i16(mmap, base + V2_OPERATION_MODE)?)?;
        let n_channels = sections.adc.entry_count as i16;
        let samples_per_sweep = read_i32(mmap, base + V2_SAMPLES_PER_EPISODE)?;

        Self::assemble(
            operation_mode,
            read_f32(mmap, base + V2_ADC_SEQUENCE_INTERVAL)?,
            n_channels,
            samples_per_sweep,
            read_f32(mmap, base + V2_ADC_RANGE)?,
            read_i32(mmap, base + V2_ADC_RESOLUTION)?,
            header,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        operation_mode: OperationMode,
        adc_sequence_interval_us: f32,
        n_channels: i16,
        samples_per_sweep: i32,
        adc_range: f32,
        adc_resolution: i32,
        header: &Header,
    ) -> Result<Self> {
        if n_channels < 1 {
            return Err(anyhow!("Invalid channel count: {}", n_channels));
        }
        if adc_sequence_interval_us <= 0.0 {
            return Err(anyhow!(
                "Invalid ADC sequence interval: {} µs",
                adc_sequence_interval_us
            ));
        }
        let n_channels = n_channels as usize;

        // Gap-free and oscilloscope records are one continuous sweep; the
        // per-episode sample count is meaningless there, so the whole record
        // becomes the sweep.
        let (samples_per_sweep, sweep_count) = match operation_mode {
            OperationMode::GapFree | OperationMode::Oscilloscope => (header.total_samples, 1),
            _ => {
                if samples_per_sweep <= 0 {
                    return Err(anyhow!(
                        "Invalid lNumSamplesPerEpisode: {}",
                        samples_per_sweep
                    ));
                }
                (samples_per_sweep as usize, header.sweep_count())
            }
        };

        let protocol = Self {
            operation_mode,
            adc_sequence_interval_us,
            n_channels,
            samples_per_sweep,
            sweep_count,
            adc_range,
            adc_resolution,
        };
        protocol.validate(header.total_samples)?;
        Ok(protocol)
    }

    /// Check the sweep arithmetic against the stored sample count
    fn validate(&self, total_samples: usize) -> Result<()> {
        if self.samples_per_sweep % self.n_channels != 0 {
            return Err(anyhow!(
                "Samples per sweep ({}) not divisible by channel count ({})",
                self.samples_per_sweep,
                self.n_channels
            ));
        }
        let expected = self.samples_per_sweep * self.sweep_count;
        if expected != total_samples {
            return Err(anyhow!(
                "Sweep layout mismatch: {} sweeps × {} samples/sweep = {}, but file stores {} samples",
                self.sweep_count,
                self.samples_per_sweep,
                expected,
                total_samples
            ));
        }
        Ok(())
    }

    /// Per-channel sampling rate in Hz
    ///
    /// `fADCSampleInterval` / `fADCSequenceInterval` is the interval of the
    /// multiplexed ADC, so the per-channel rate divides by the channel count.
    #[must_use]
    pub fn sampling_rate(&self) -> f64 {
        1e6 / (f64::from(self.adc_sequence_interval_us) * self.n_channels as f64)
    }

    /// Samples per sweep for a single channel
    #[must_use]
    pub const fn samples_per_sweep_per_channel(&self) -> usize {
        self.samples_per_sweep / self.n_channels
    }

    /// Count-to-volts step of the ADC (`fADCRange / lADCResolution`)
    #[must_use]
    pub fn counts_to_range(&self) -> f32 {
        self.adc_range / self.adc_resolution as f32
    }
}
