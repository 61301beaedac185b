// Internal crate imports
use crate::{
    channel::{AdcChannel, ChannelMap, SampleValue, SweepDataFrame, channel_map},
    datatype::AbfDataFormat,
    header::Header,
    protocol::AcquisitionProtocol,
    sweep_label,
    version::AbfVersion,
};
// Standard library imports
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// External crate imports
use anyhow::{Result, anyhow};
use byteorder::{ByteOrder, LittleEndian as LE};
use memmap3::{Mmap, MmapOptions};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Threshold for parallel channel demultiplexing: below this many stored
/// samples the rayon overhead exceeds the benefit
const PARALLEL_THRESHOLD: usize = 400_000;

/// A shareable wrapper around the file path and memory-map
///
/// Uses Arc<Mmap> to share the memory mapping across clones without creating
/// new file descriptors or memory mappings.
#[derive(Debug, Clone)]
pub struct AccessWrapper {
    /// An owned, mutable path to the file on disk
    pub path: PathBuf,
    /// The memory-mapped file, shared via Arc for efficient cloning
    ///
    /// # Safety
    /// The Mmap is created from a File handle and remains valid as long as:
    /// 1. The file is not truncated while mapped
    /// 2. The file contents are not modified while mapped (we only read)
    /// 3. The Mmap is not accessed after the file is deleted
    ///
    /// ABF files are read-only once opened; we never write back to them.
    pub mmap: Arc<Mmap>,
}

impl AccessWrapper {
    /// Creates a new `AccessWrapper` from a file path
    /// # Errors
    /// Will return `Err` if:
    /// - the file cannot be opened
    /// - the file cannot be memory-mapped
    pub fn new(path: &Path) -> Result<Self> {
        let file = File::open(path)?;

        // memmap3 provides better safety guarantees than memmap2, though OS-level
        // memory mapping still requires unsafe at creation time.
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        Ok(Self {
            path: path.to_path_buf(),
            mmap: Arc::new(mmap),
        })
    }
}

impl Deref for AccessWrapper {
    type Target = Mmap;

    fn deref(&self) -> &Self::Target {
        &self.mmap
    }
}

/// A struct representing an open ABF recording
#[derive(Debug, Clone)]
pub struct Abf {
    /// File generation, sample format, and DATA section location
    pub header: Header,
    /// Version-independent acquisition settings
    pub protocol: AcquisitionProtocol,
    /// Recorded channels in multiplex order
    pub channels: Vec<AdcChannel>,
    /// File GUID (from the file for ABF2, generated for ABF1)
    pub guid: String,

    /// Sweep data in long form via a Polars DataFrame: a `sweep` label
    /// column, a per-sweep `time` column, and one f32 column per channel.
    /// Rows are sweep-major in recording order.
    pub data_frame: SweepDataFrame,

    /// A wrapper around the file, path, and memory-map
    pub file_access: AccessWrapper,
}

impl Abf {
    /// Opens and parses an ABF file from the given path
    ///
    /// This is the primary entry point for reading ABF files. It:
    /// - Validates the file extension (must be `.abf`)
    /// - Memory-maps the file for efficient access
    /// - Parses the header and dispatches on the file generation
    /// - Reads the acquisition protocol and channel metadata
    /// - Decodes the DATA section (scaling int16 counts to physical units)
    /// - Builds the long sweep table with `sweep` and `time` columns
    ///
    /// # Errors
    /// Will return `Err` if:
    /// - the file cannot be opened or memory-mapped
    /// - the file extension is not `.abf`
    /// - the signature, header, or section map is invalid
    /// - the DATA section is shorter than the header promises
    ///
    /// # Example
    /// ```no_run
    /// use ephys_abf::Abf;
    ///
    /// let abf = Abf::open("data/cell01.abf".as_ref())?;
    /// println!("{} sweeps of {} channels", abf.n_sweeps(), abf.channels.len());
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn open(path: &Path) -> Result<Self> {
        let file_access = AccessWrapper::new(path)?;
        Self::validate_abf_extension(&file_access.path)?;

        let header = Header::from_mmap(&file_access.mmap)?;
        let (protocol, channels) = match header.version {
            AbfVersion::V1 => {
                let protocol = AcquisitionProtocol::from_v1_mmap(&file_access.mmap, &header)?;
                let channels = AdcChannel::channels_from_v1_mmap(&file_access.mmap, &protocol)?;
                (protocol, channels)
            }
            AbfVersion::V2 => {
                let sections = header
                    .sections
                    .as_ref()
                    .ok_or_else(|| anyhow!("ABF2 header is missing its section map"))?;
                (
                    AcquisitionProtocol::from_v2_mmap(&file_access.mmap, sections, &header)?,
                    AdcChannel::channels_from_v2_mmap(&file_access.mmap, sections)?,
                )
            }
        };

        if channels.len() != protocol.n_channels {
            return Err(anyhow!(
                "Channel metadata count ({}) disagrees with protocol channel count ({})",
                channels.len(),
                protocol.n_channels
            ));
        }

        // ABF1 files carry no GUID; generate one so every open record has an
        // identity downstream.
        let guid = header
            .guid
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let data_frame =
            Self::store_sweeps_as_dataframe(&header, &protocol, &channels, &file_access.mmap)?;

        debug!(
            "ABF file loaded: {} ({:.2}), {} channels, {} sweeps at {:.1} Hz",
            header.version,
            header.file_version,
            protocol.n_channels,
            protocol.sweep_count,
            protocol.sampling_rate()
        );

        Ok(Self {
            header,
            protocol,
            channels,
            guid,
            data_frame,
            file_access,
        })
    }

    /// Validates that the file extension is `.abf`
    /// # Errors
    /// Will return `Err` if the file extension is not `.abf`
    fn validate_abf_extension(path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .ok_or_else(|| anyhow!("File has no extension"))?
            .to_str()
            .ok_or_else(|| anyhow!("File extension is not valid UTF-8"))?;

        if !extension.eq_ignore_ascii_case("abf") {
            return Err(anyhow!("Invalid file extension: {}", extension));
        }

        Ok(())
    }

    /// Decodes the DATA section and stores it as a long Polars DataFrame
    ///
    /// Samples are stored channel-interleaved in multiplex order; this
    /// demultiplexes them into one column per channel, applying the count
    /// scaling chain for int16 files. Channels are decoded in parallel once
    /// the record is large enough to amortize the rayon overhead.
    ///
    /// # Errors
    /// Will return `Err` if:
    /// - the DATA section is shorter than the header promises
    /// - the DataFrame cannot be constructed
    fn store_sweeps_as_dataframe(
        header: &Header,
        protocol: &AcquisitionProtocol,
        channels: &[AdcChannel],
        mmap: &Mmap,
    ) -> Result<SweepDataFrame> {
        let bytes_per_sample = header.data_format.bytes_per_sample();
        let needed = header.total_samples * bytes_per_sample;
        let available = mmap.len().saturating_sub(header.data_start);
        if available < needed {
            return Err(anyhow!(
                "Insufficient data: expected {} bytes ({} samples × {} bytes/sample), but only {} remain after the header",
                needed,
                header.total_samples,
                bytes_per_sample,
                available
            ));
        }
        if available > needed {
            debug!(
                "{} trailing bytes after the DATA section (synch/tag sections)",
                available - needed
            );
        }
        let data_bytes = &mmap[header.data_start..header.data_start + needed];

        let n_channels = protocol.n_channels;
        let per_channel = header.total_samples / n_channels;

        // Demultiplex each channel, scaling counts to physical units
        let decode_channel = |(position, channel): (usize, &AdcChannel)| -> Vec<SampleValue> {
            match header.data_format {
                AbfDataFormat::Int16 => {
                    let scale = channel.count_scale(protocol);
                    let offset = channel.count_offset();
                    match cast_i16_samples(data_bytes) {
                        // Fast path: aligned little-endian host, zero-copy view
                        Some(raw) => (0..per_channel)
                            .map(|k| raw[k * n_channels + position] as f32 * scale + offset)
                            .collect(),
                        None => (0..per_channel)
                            .map(|k| {
                                let at = (k * n_channels + position) * 2;
                                f32::from(LE::read_i16(&data_bytes[at..at + 2])) * scale + offset
                            })
                            .collect(),
                    }
                }
                AbfDataFormat::Float32 => match cast_f32_samples(data_bytes) {
                    Some(raw) => (0..per_channel)
                        .map(|k| raw[k * n_channels + position])
                        .collect(),
                    None => (0..per_channel)
                        .map(|k| {
                            let at = (k * n_channels + position) * 4;
                            LE::read_f32(&data_bytes[at..at + 4])
                        })
                        .collect(),
                },
            }
        };

        let channel_values: Vec<Vec<SampleValue>> = if header.total_samples >= PARALLEL_THRESHOLD {
            channels.par_iter().enumerate().map(decode_channel).collect()
        } else {
            channels.iter().enumerate().map(decode_channel).collect()
        };

        // Sweep labels and a per-sweep time axis (restarting at zero each
        // sweep, matching how sweeps are overlaid during analysis)
        let samples_per_sweep = protocol.samples_per_sweep_per_channel();
        let dt = 1.0 / protocol.sampling_rate();
        let mut sweep_column = Vec::with_capacity(per_channel);
        let mut time_column = Vec::with_capacity(per_channel);
        for sweep in 0..protocol.sweep_count {
            let label = sweep_label(sweep + 1);
            for k in 0..samples_per_sweep {
                sweep_column.push(label.clone());
                time_column.push((k as f64 * dt) as f32);
            }
        }

        let mut columns = Vec::with_capacity(channels.len() + 2);
        columns.push(Column::new("sweep".into(), sweep_column));
        columns.push(Column::new("time".into(), time_column));
        for (channel, values) in channels.iter().zip(channel_values) {
            columns.push(Column::new(channel.channel_name.as_ref().into(), values));
        }

        Ok(Arc::new(DataFrame::new(columns)?))
    }

    /// Channel names in multiplex order
    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        self.channels
            .iter()
            .map(|c| c.channel_name.to_string())
            .collect()
    }

    /// Name → channel lookup map
    #[must_use]
    pub fn channel_map(&self) -> ChannelMap {
        channel_map(&self.channels)
    }

    /// Number of sweeps in the record
    #[must_use]
    pub fn n_sweeps(&self) -> usize {
        self.protocol.sweep_count
    }

    /// Samples per sweep for a single channel
    #[must_use]
    pub fn samples_per_sweep(&self) -> usize {
        self.protocol.samples_per_sweep_per_channel()
    }

    /// Per-channel sampling rate in Hz
    #[must_use]
    pub fn sampling_rate(&self) -> f64 {
        self.protocol.sampling_rate()
    }

    /// Sweep labels in recording order (`sweep001`, `sweep002`, …)
    #[must_use]
    pub fn sweep_labels(&self) -> Vec<String> {
        (1..=self.n_sweeps()).map(sweep_label).collect()
    }

    /// Full-record samples for one channel as f64 (all sweeps concatenated)
    /// # Errors
    /// Will return `Err` if the channel does not exist or is not numeric
    pub fn get_channel_f64(&self, channel: &str) -> Result<Vec<f64>> {
        let series = self
            .data_frame
            .column(channel)
            .map_err(|_| anyhow!("Channel not found in ABF file: {}", channel))?;

        let values = if let Ok(f32_vals) = series.f32() {
            f32_vals
                .into_iter()
                .flatten()
                .map(f64::from)
                .collect()
        } else if let Ok(f64_vals) = series.f64() {
            f64_vals.into_iter().flatten().collect()
        } else {
            return Err(anyhow!(
                "Channel {} is not numeric (dtype: {:?})",
                channel,
                series.dtype()
            ));
        };
        Ok(values)
    }

    /// The rows of a single sweep
    /// # Errors
    /// Will return `Err` if the label matches no sweep
    pub fn sweep_frame(&self, label: &str) -> Result<DataFrame> {
        let frame = self
            .data_frame
            .as_ref()
            .clone()
            .lazy()
            .filter(col("sweep").eq(lit(label)))
            .collect()?;
        if frame.height() == 0 {
            return Err(anyhow!("No sweep labeled {:?} in file", label));
        }
        Ok(frame)
    }

    /// Serialize a summary of the file (header, protocol, channels) as JSON
    /// # Errors
    /// Will return `Err` if serialization fails
    pub fn info_json(&self) -> Result<String> {
        let info = AbfInfo {
            path: self.file_access.path.display().to_string(),
            version: self.header.version,
            file_version: self.header.file_version,
            data_format: self.header.data_format,
            guid: self.guid.clone(),
            sampling_rate_hz: self.sampling_rate(),
            n_channels: self.protocol.n_channels,
            n_sweeps: self.n_sweeps(),
            samples_per_sweep: self.samples_per_sweep(),
            channels: self.channels.clone(),
        };
        Ok(serde_json::to_string_pretty(&info)?)
    }
}

/// JSON-facing summary of an open ABF file
#[derive(Serialize)]
struct AbfInfo {
    path: String,
    version: AbfVersion,
    file_version: f32,
    data_format: AbfDataFormat,
    guid: String,
    sampling_rate_hz: f64,
    n_channels: usize,
    n_sweeps: usize,
    samples_per_sweep: usize,
    channels: Vec<AdcChannel>,
}

/// Zero-copy view of the DATA section as i16 samples
///
/// Returns `None` when the host is big-endian or the slice is misaligned,
/// in which case the caller falls back to byte-wise decoding. The DATA
/// section starts on a 512-byte block boundary of a page-aligned map, so in
/// practice the cast succeeds on little-endian hosts.
fn cast_i16_samples(bytes: &[u8]) -> Option<&[i16]> {
    if cfg!(target_endian = "little") {
        bytemuck::try_cast_slice(bytes).ok()
    } else {
        None
    }
}

/// Zero-copy view of the DATA section as f32 samples (see `cast_i16_samples`)
fn cast_f32_samples(bytes: &[u8]) -> Option<&[f32]> {
    if cfg!(target_endian = "little") {
        bytemuck::try_cast_slice(bytes).ok()
    } else {
        None
    }
}
