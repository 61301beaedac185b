use super::header::{
    V1_ADC_CHANNEL_NAME, V1_ADC_SAMPLING_SEQ, V1_ADC_UNITS, V1_INSTRUMENT_OFFSET,
    V1_INSTRUMENT_SCALE, V1_PROGRAMMABLE_GAIN, V1_SIGNAL_GAIN, V1_SIGNAL_OFFSET,
    V1_TELEGRAPH_ENABLE, V1_TELEGRAPH_GAIN, read_f32, read_i16, read_i32, slice, trim_padded_str,
};
use super::protocol::AcquisitionProtocol;
use super::section::{SectionMap, indexed_string, read_indexed_strings};
use anyhow::{Result, anyhow};
use derive_builder::Builder;
use itertools::Itertools;
use memmap3::Mmap;
use polars::prelude::DataFrame;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;

/// Sweep data stored as a Polars DataFrame for efficient columnar access
///
/// One f32 column per recorded channel, plus a `sweep` label column and a
/// `time` column that restarts at 0.0 for each sweep.
pub type SweepDataFrame = Arc<DataFrame>;
pub type SampleValue = f32;
pub type ChannelName = Arc<str>;
pub type ChannelMap = FxHashMap<ChannelName, AdcChannel>;

// ABF2 ADCSection entry layout (byte offsets within one entry)
const V2_ADC_NUM: usize = 0; // nADCNum, i16
const V2_TELEGRAPH_ENABLE: usize = 2; // nTelegraphEnable, i16
const V2_TELEGRAPH_GAIN: usize = 6; // fTelegraphAdditGain, f32
const V2_PROGRAMMABLE_GAIN: usize = 28; // fADCProgrammableGain, f32
const V2_INSTRUMENT_SCALE: usize = 40; // fInstrumentScaleFactor, f32
const V2_INSTRUMENT_OFFSET: usize = 44; // fInstrumentOffset, f32
const V2_SIGNAL_GAIN: usize = 48; // fSignalGain, f32
const V2_SIGNAL_OFFSET: usize = 52; // fSignalOffset, f32
const V2_CHANNEL_NAME_INDEX: usize = 74; // lADCChannelNameIndex, i32
const V2_UNITS_INDEX: usize = 78; // lADCUnitsIndex, i32

// Fixed-width string fields in the v1 header
const V1_NAME_WIDTH: usize = 10;
const V1_UNITS_WIDTH: usize = 8;

/// Per-channel acquisition metadata and the gain chain for count scaling
#[derive(Serialize, Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct AdcChannel {
    /// Physical ADC input number (`nADCNum`)
    pub adc_number: i16,
    /// Channel name from the header/string table (e.g. "IN 0", "Vm")
    pub channel_name: ChannelName,
    /// Engineering units of the scaled signal (e.g. "mV", "pA")
    pub units: Arc<str>,
    pub instrument_scale_factor: f32,
    pub instrument_offset: f32,
    pub signal_gain: f32,
    pub signal_offset: f32,
    pub programmable_gain: f32,
    pub telegraph_enabled: bool,
    pub telegraph_gain: f32,
}

impl AdcChannel {
    /// Multiplicative factor converting raw int16 counts to physical units
    ///
    /// `counts × adc_range / adc_resolution` undoes the digitizer, and the
    /// gain chain (instrument scale factor, signal gain, programmable gain,
    /// telegraph gain when telegraphed) undoes the amplifier.
    #[must_use]
    pub fn count_scale(&self, protocol: &AcquisitionProtocol) -> f32 {
        let mut gain = self.instrument_scale_factor * self.signal_gain * self.programmable_gain;
        if self.telegraph_enabled {
            gain *= self.telegraph_gain;
        }
        protocol.counts_to_range() / gain
    }

    /// Additive offset applied after scaling
    #[must_use]
    pub fn count_offset(&self) -> f32 {
        self.instrument_offset - self.signal_offset
    }

    /// Name used when the file stores none for this channel
    #[must_use]
    pub fn fallback_name(index: usize) -> ChannelName {
        format!("channel_{index}").into()
    }

    /// Read the recorded channels from an ABF1 header block
    ///
    /// The v1 header stores 16-wide arrays indexed by ADC number; the
    /// sampling sequence (`nADCSamplingSeq`) gives the multiplex order of
    /// the recorded subset.
    ///
    /// # Errors
    /// Will return `Err` if the header is truncated or the sampling sequence is invalid
    pub fn channels_from_v1_mmap(
        mmap: &Mmap,
        protocol: &AcquisitionProtocol,
    ) -> Result<Vec<Self>> {
        let mut channels = Vec::with_capacity(protocol.n_channels);
        for position in 0..protocol.n_channels {
            let adc_number = read_i16(mmap, V1_ADC_SAMPLING_SEQ + position * 2)?;
            if !(0..16).contains(&adc_number) {
                return Err(anyhow!(
                    "Sampling sequence entry {} holds invalid ADC number {}",
                    position,
                    adc_number
                ));
            }
            let n = adc_number as usize;

            let name_bytes = slice(mmap, V1_ADC_CHANNEL_NAME + n * V1_NAME_WIDTH, V1_NAME_WIDTH)?;
            let units_bytes = slice(mmap, V1_ADC_UNITS + n * V1_UNITS_WIDTH, V1_UNITS_WIDTH)?;
            let name = trim_padded_str(name_bytes);

            channels.push(Self {
                adc_number,
                channel_name: if name.is_empty() {
                    Self::fallback_name(position)
                } else {
                    name.into()
                },
                units: trim_padded_str(units_bytes).into(),
                instrument_scale_factor: read_f32(mmap, V1_INSTRUMENT_SCALE + n * 4)?,
                instrument_offset: read_f32(mmap, V1_INSTRUMENT_OFFSET + n * 4)?,
                signal_gain: read_f32(mmap, V1_SIGNAL_GAIN + n * 4)?,
                signal_offset: read_f32(mmap, V1_SIGNAL_OFFSET + n * 4)?,
                programmable_gain: read_f32(mmap, V1_PROGRAMMABLE_GAIN + n * 4)?,
                telegraph_enabled: read_i16(mmap, V1_TELEGRAPH_ENABLE + n * 2)? != 0,
                telegraph_gain: read_f32(mmap, V1_TELEGRAPH_GAIN + n * 4)?,
            });
        }
        Self::ensure_unique_names(&channels)?;
        Ok(channels)
    }

    /// Read the recorded channels from an ABF2 ADCSection
    ///
    /// Names and units are 1-based indices into the Strings section.
    ///
    /// # Errors
    /// Will return `Err` if the ADC section is missing or truncated
    pub fn channels_from_v2_mmap(mmap: &Mmap, sections: &SectionMap) -> Result<Vec<Self>> {
        let adc = &sections.adc;
        if adc.is_empty() {
            return Err(anyhow!("ABF2 file has no ADCSection"));
        }
        let strings = read_indexed_strings(mmap, &sections.strings)?;

        let mut channels = Vec::with_capacity(adc.entry_count);
        for position in 0..adc.entry_count {
            let base = adc.entry_start(position);
            let name_index = read_i32(mmap, base + V2_CHANNEL_NAME_INDEX)?.max(0) as usize;
            let units_index = read_i32(mmap, base + V2_UNITS_INDEX)?.max(0) as usize;

            channels.push(Self {
                adc_number: read_i16(mmap, base + V2_ADC_NUM)?,
                channel_name: indexed_string(&strings, name_index)
                    .map_or_else(|| Self::fallback_name(position), Into::into),
                units: indexed_string(&strings, units_index).unwrap_or("").into(),
                instrument_scale_factor: read_f32(mmap, base + V2_INSTRUMENT_SCALE)?,
                instrument_offset: read_f32(mmap, base + V2_INSTRUMENT_OFFSET)?,
                signal_gain: read_f32(mmap, base + V2_SIGNAL_GAIN)?,
                signal_offset: read_f32(mmap, base + V2_SIGNAL_OFFSET)?,
                programmable_gain: read_f32(mmap, base + V2_PROGRAMMABLE_GAIN)?,
                telegraph_enabled: read_i16(mmap, base + V2_TELEGRAPH_ENABLE)? != 0,
                telegraph_gain: read_f32(mmap, base + V2_TELEGRAPH_GAIN)?,
            });
        }
        Self::ensure_unique_names(&channels)?;
        Ok(channels)
    }

    /// Duplicate channel names would collide as DataFrame columns
    fn ensure_unique_names(channels: &[Self]) -> Result<()> {
        let duplicates: Vec<_> = channels
            .iter()
            .map(|c| c.channel_name.as_ref())
            .duplicates()
            .collect();
        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("Duplicate channel names in file: {:?}", duplicates))
        }
    }
}

/// Build a name → channel lookup map from the ordered channel list
#[must_use]
pub fn channel_map(channels: &[AdcChannel]) -> ChannelMap {
    channels
        .iter()
        .map(|c| (c.channel_name.clone(), c.clone()))
        .collect()
}
