//! Minimal ABF writers used by tests, benches, and demos
//!
//! Real recordings come out of Clampex; these writers exist so round-trip
//! tests and example pipelines have files to chew on without shipping
//! binary fixtures. Both generations are supported with int16 or float32
//! data and a unity gain chain.

use crate::{
    datatype::AbfDataFormat,
    header::{
        BLOCK_SIZE, V1_ACTUAL_ACQ_LENGTH, V1_ACTUAL_EPISODES, V1_ADC_CHANNEL_NAME,
        V1_ADC_NUM_CHANNELS, V1_ADC_RANGE, V1_ADC_RESOLUTION, V1_ADC_SAMPLE_INTERVAL,
        V1_ADC_SAMPLING_SEQ, V1_ADC_UNITS, V1_DATA_FORMAT, V1_DATA_SECTION_PTR, V1_FILE_VERSION,
        V1_HEADER_LEN, V1_INSTRUMENT_OFFSET, V1_INSTRUMENT_SCALE, V1_OPERATION_MODE,
        V1_PROGRAMMABLE_GAIN, V1_SAMPLES_PER_EPISODE, V1_SIGNAL_GAIN, V1_SIGNAL_OFFSET,
        V1_TELEGRAPH_ENABLE, V1_TELEGRAPH_GAIN, V2_ACTUAL_EPISODES, V2_DATA_FORMAT,
        V2_FILE_GUID, V2_FILE_VERSION,
    },
    protocol::OperationMode,
};
use anyhow::{Result, anyhow};
use byteorder::{ByteOrder, LittleEndian as LE};
use std::fs;
use std::path::Path;

/// Everything needed to synthesize an ABF file
///
/// `sweeps` is indexed `[sweep][channel][sample]` in physical units. The
/// writers use a unity gain chain, so int16 files quantize values with the
/// ADC step `adc_range / adc_resolution`.
#[derive(Clone, Debug)]
pub struct AbfWriteSpec {
    pub operation_mode: OperationMode,
    pub data_format: AbfDataFormat,
    /// Interval between samples of the multiplexed ADC, in microseconds
    pub adc_sequence_interval_us: f32,
    pub adc_range: f32,
    pub adc_resolution: i32,
    pub channel_names: Vec<String>,
    pub channel_units: Vec<String>,
    pub sweeps: Vec<Vec<Vec<f32>>>,
}

impl AbfWriteSpec {
    /// Episodic int16 spec with a ±10 V range and 10 kHz per-channel sampling
    #[must_use]
    pub fn new(
        sweeps: Vec<Vec<Vec<f32>>>,
        channel_names: Vec<String>,
        channel_units: Vec<String>,
    ) -> Self {
        let n_channels = channel_names.len().max(1) as f32;
        Self {
            operation_mode: OperationMode::Episodic,
            data_format: AbfDataFormat::Int16,
            adc_sequence_interval_us: 100.0 / n_channels,
            adc_range: 10.0,
            adc_resolution: 32_768,
            channel_names,
            channel_units,
            sweeps,
        }
    }

    fn validate(&self) -> Result<(usize, usize, usize)> {
        let n_sweeps = self.sweeps.len();
        if n_sweeps == 0 {
            return Err(anyhow!("Write spec holds no sweeps"));
        }
        let n_channels = self.channel_names.len();
        if n_channels == 0 || n_channels > 16 {
            return Err(anyhow!("Channel count must be 1..=16, got {}", n_channels));
        }
        if self.channel_units.len() != n_channels {
            return Err(anyhow!(
                "Units count ({}) disagrees with channel count ({})",
                self.channel_units.len(),
                n_channels
            ));
        }
        let samples = self
            .sweeps
            .first()
            .and_then(|s| s.first())
            .map(Vec::len)
            .unwrap_or(0);
        if samples == 0 {
            return Err(anyhow!("Write spec holds empty sweeps"));
        }
        for (i, sweep) in self.sweeps.iter().enumerate() {
            if sweep.len() != n_channels {
                return Err(anyhow!("Sweep {} has {} channels, expected {}", i, sweep.len(), n_channels));
            }
            if sweep.iter().any(|c| c.len() != samples) {
                return Err(anyhow!("Sweep {} has ragged channel lengths", i));
            }
        }
        if matches!(
            self.operation_mode,
            OperationMode::GapFree | OperationMode::Oscilloscope
        ) && n_sweeps != 1
        {
            return Err(anyhow!("Gap-free records must be a single sweep"));
        }
        Ok((n_sweeps, n_channels, samples))
    }

    /// Encode the sweep data channel-interleaved, sweep-major
    fn encode_data(&self) -> Vec<u8> {
        let step = self.adc_range / self.adc_resolution as f32;
        let mut out = Vec::new();
        for sweep in &self.sweeps {
            let samples = sweep[0].len();
            for k in 0..samples {
                for channel in sweep {
                    match self.data_format {
                        AbfDataFormat::Int16 => {
                            let raw = (channel[k] / step).round();
                            let raw = raw.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
                            let mut buf = [0u8; 2];
                            LE::write_i16(&mut buf, raw);
                            out.extend_from_slice(&buf);
                        }
                        AbfDataFormat::Float32 => {
                            let mut buf = [0u8; 4];
                            LE::write_f32(&mut buf, channel[k]);
                            out.extend_from_slice(&buf);
                        }
                    }
                }
            }
        }
        out
    }
}

fn put_i16(buf: &mut [u8], offset: usize, value: i16) {
    LE::write_i16(&mut buf[offset..offset + 2], value);
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    LE::write_u16(&mut buf[offset..offset + 2], value);
}

fn put_i32(buf: &mut [u8], offset: usize, value: i32) {
    LE::write_i32(&mut buf[offset..offset + 4], value);
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    LE::write_u32(&mut buf[offset..offset + 4], value);
}

fn put_i64(buf: &mut [u8], offset: usize, value: i64) {
    LE::write_i64(&mut buf[offset..offset + 8], value);
}

fn put_f32(buf: &mut [u8], offset: usize, value: f32) {
    LE::write_f32(&mut buf[offset..offset + 4], value);
}

fn put_padded_str(buf: &mut [u8], offset: usize, width: usize, text: &str) {
    let bytes = text.as_bytes();
    let n = bytes.len().min(width);
    buf[offset..offset + n].copy_from_slice(&bytes[..n]);
}

fn pad_to_block(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// Write an ABF1 (v1.83) file from the given spec
///
/// The extended 6144-byte header is filled with the fixed-offset fields this
/// crate reads back: acquisition mode, sweep layout, ADC scaling, sampling
/// sequence, channel names/units, and a unity gain chain.
///
/// # Errors
/// Will return `Err` if the spec is inconsistent or the file cannot be written
pub fn write_abf1_file(path: &Path, spec: &AbfWriteSpec) -> Result<()> {
    let (n_sweeps, n_channels, samples) = spec.validate()?;

    let mut header = vec![0u8; V1_HEADER_LEN];
    header[..4].copy_from_slice(b"ABF ");
    put_f32(&mut header, V1_FILE_VERSION, 1.83);
    put_i16(&mut header, V1_OPERATION_MODE, spec.operation_mode.mode_code());
    put_i32(
        &mut header,
        V1_ACTUAL_ACQ_LENGTH,
        (n_sweeps * n_channels * samples) as i32,
    );
    put_i32(&mut header, V1_ACTUAL_EPISODES, n_sweeps as i32);
    put_i32(
        &mut header,
        V1_DATA_SECTION_PTR,
        (V1_HEADER_LEN / BLOCK_SIZE) as i32,
    );
    put_i16(&mut header, V1_DATA_FORMAT, spec.data_format.format_code());
    put_i16(&mut header, V1_ADC_NUM_CHANNELS, n_channels as i16);
    put_f32(
        &mut header,
        V1_ADC_SAMPLE_INTERVAL,
        spec.adc_sequence_interval_us,
    );
    put_i32(
        &mut header,
        V1_SAMPLES_PER_EPISODE,
        (n_channels * samples) as i32,
    );
    put_f32(&mut header, V1_ADC_RANGE, spec.adc_range);
    put_i32(&mut header, V1_ADC_RESOLUTION, spec.adc_resolution);

    for n in 0..16 {
        // Unity gain chain for all 16 ADC slots; telegraphs disabled
        put_f32(&mut header, V1_PROGRAMMABLE_GAIN + n * 4, 1.0);
        put_f32(&mut header, V1_INSTRUMENT_SCALE + n * 4, 1.0);
        put_f32(&mut header, V1_INSTRUMENT_OFFSET + n * 4, 0.0);
        put_f32(&mut header, V1_SIGNAL_GAIN + n * 4, 1.0);
        put_f32(&mut header, V1_SIGNAL_OFFSET + n * 4, 0.0);
        put_i16(&mut header, V1_TELEGRAPH_ENABLE + n * 2, 0);
        put_f32(&mut header, V1_TELEGRAPH_GAIN + n * 4, 1.0);
    }
    for (i, (name, units)) in spec
        .channel_names
        .iter()
        .zip(&spec.channel_units)
        .enumerate()
    {
        put_i16(&mut header, V1_ADC_SAMPLING_SEQ + i * 2, i as i16);
        put_padded_str(&mut header, V1_ADC_CHANNEL_NAME + i * 10, 10, name);
        put_padded_str(&mut header, V1_ADC_UNITS + i * 8, 8, units);
    }

    let mut bytes = header;
    bytes.extend_from_slice(&spec.encode_data());
    fs::write(path, bytes)?;
    Ok(())
}

/// Write an ABF2 file from the given spec, with an optional file GUID
///
/// Lays out one block each for the file info and ProtocolSection, then the
/// ADCSection, Strings section (NUL-delimited, 1-based indices), and DATA
/// section, and records them in the section map.
///
/// # Errors
/// Will return `Err` if the spec is inconsistent or the file cannot be written
pub fn write_abf2_file(path: &Path, spec: &AbfWriteSpec, guid: Option<[u8; 16]>) -> Result<()> {
    let (n_sweeps, n_channels, samples) = spec.validate()?;

    // ABF2 ADCSection entries are written 128 bytes apart
    const ADC_ENTRY_BYTES: usize = 128;
    // Section-map slots (see SectionMap::from_mmap)
    const SLOT_PROTOCOL: usize = 0;
    const SLOT_ADC: usize = 1;
    const SLOT_STRINGS: usize = 9;
    const SLOT_DATA: usize = 10;

    // Strings table: leading NUL so indices are 1-based, then alternating
    // name/units entries, each NUL-terminated
    let mut strings_blob = vec![0u8];
    for (name, units) in spec.channel_names.iter().zip(&spec.channel_units) {
        strings_blob.extend_from_slice(name.as_bytes());
        strings_blob.push(0);
        strings_blob.extend_from_slice(units.as_bytes());
        strings_blob.push(0);
    }

    let protocol_block = 1usize;
    let adc_block = 2usize;
    let adc_bytes = pad_to_block(n_channels * ADC_ENTRY_BYTES);
    let strings_block = adc_block + adc_bytes / BLOCK_SIZE;
    let strings_bytes = pad_to_block(strings_blob.len());
    let data_block = strings_block + strings_bytes / BLOCK_SIZE;

    let total_samples = n_sweeps * n_channels * samples;
    let mut bytes = vec![0u8; data_block * BLOCK_SIZE];

    // File info block
    bytes[..4].copy_from_slice(b"ABF2");
    bytes[V2_FILE_VERSION..V2_FILE_VERSION + 4].copy_from_slice(&[0, 0, 0, 2]);
    put_u32(&mut bytes, 8, BLOCK_SIZE as u32); // uFileInfoSize
    put_u32(&mut bytes, V2_ACTUAL_EPISODES, n_sweeps as u32);
    put_u16(&mut bytes, V2_DATA_FORMAT, spec.data_format.format_code() as u16);
    if let Some(guid) = guid {
        bytes[V2_FILE_GUID..V2_FILE_GUID + 16].copy_from_slice(&guid);
    }

    // Section map
    let mut put_section = |slot: usize, block: usize, entry_bytes: usize, count: i64| {
        let at = 76 + slot * 16;
        put_u32(&mut bytes, at, block as u32);
        put_u32(&mut bytes, at + 4, entry_bytes as u32);
        put_i64(&mut bytes, at + 8, count);
    };
    put_section(SLOT_PROTOCOL, protocol_block, BLOCK_SIZE, 1);
    put_section(SLOT_ADC, adc_block, ADC_ENTRY_BYTES, n_channels as i64);
    put_section(SLOT_STRINGS, strings_block, strings_bytes, 1);
    put_section(
        SLOT_DATA,
        data_block,
        spec.data_format.bytes_per_sample(),
        total_samples as i64,
    );

    // ProtocolSection
    let p = protocol_block * BLOCK_SIZE;
    put_i16(&mut bytes, p, spec.operation_mode.mode_code());
    put_f32(&mut bytes, p + 2, spec.adc_sequence_interval_us);
    put_i32(&mut bytes, p + 22, (n_channels * samples) as i32);
    put_f32(&mut bytes, p + 110, spec.adc_range);
    put_i32(&mut bytes, p + 118, spec.adc_resolution);

    // ADCSection: unity gain chain, string-table indices 1, 2, 3, 4, …
    for i in 0..n_channels {
        let a = adc_block * BLOCK_SIZE + i * ADC_ENTRY_BYTES;
        put_i16(&mut bytes, a, i as i16); // nADCNum
        put_i16(&mut bytes, a + 2, 0); // nTelegraphEnable
        put_f32(&mut bytes, a + 6, 1.0); // fTelegraphAdditGain
        put_f32(&mut bytes, a + 28, 1.0); // fADCProgrammableGain
        put_f32(&mut bytes, a + 40, 1.0); // fInstrumentScaleFactor
        put_f32(&mut bytes, a + 44, 0.0); // fInstrumentOffset
        put_f32(&mut bytes, a + 48, 1.0); // fSignalGain
        put_f32(&mut bytes, a + 52, 0.0); // fSignalOffset
        put_i32(&mut bytes, a + 74, (1 + 2 * i) as i32); // lADCChannelNameIndex
        put_i32(&mut bytes, a + 78, (2 + 2 * i) as i32); // lADCUnitsIndex
    }

    // Strings section
    let s = strings_block * BLOCK_SIZE;
    bytes[s..s + strings_blob.len()].copy_from_slice(&strings_blob);

    bytes.extend_from_slice(&spec.encode_data());
    fs::write(path, bytes)?;
    Ok(())
}
