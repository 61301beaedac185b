use super::{datatype::AbfDataFormat, section::SectionMap, version::AbfVersion};
use anyhow::{Result, anyhow};
use byteorder::{ByteOrder, LittleEndian as LE};
use memmap3::Mmap;
use serde::Serialize;
use uuid::Uuid;

/// ABF files are addressed in 512-byte blocks; section pointers are block indices
pub const BLOCK_SIZE: usize = 512;

// ABF1 fixed header layout (byte offsets into the header block). The v1
// header is a single packed struct, so every field lives at a known offset.
// Offsets follow the Axon File Support Pack ABFFileHeader definition.
pub(crate) const V1_FILE_VERSION: usize = 4; // fFileVersionNumber, f32
pub(crate) const V1_OPERATION_MODE: usize = 8; // nOperationMode, i16
pub(crate) const V1_ACTUAL_ACQ_LENGTH: usize = 10; // lActualAcqLength, i32
pub(crate) const V1_ACTUAL_EPISODES: usize = 16; // lActualEpisodes, i32
pub(crate) const V1_DATA_SECTION_PTR: usize = 40; // lDataSectionPtr, i32 (block index)
pub(crate) const V1_DATA_FORMAT: usize = 100; // nDataFormat, i16
pub(crate) const V1_ADC_NUM_CHANNELS: usize = 120; // nADCNumChannels, i16
pub(crate) const V1_ADC_SAMPLE_INTERVAL: usize = 122; // fADCSampleInterval, f32 (µs, multiplexed)
pub(crate) const V1_SAMPLES_PER_EPISODE: usize = 138; // lNumSamplesPerEpisode, i32 (multiplexed)
pub(crate) const V1_ADC_RANGE: usize = 244; // fADCRange, f32
pub(crate) const V1_ADC_RESOLUTION: usize = 252; // lADCResolution, i32
pub(crate) const V1_ADC_SAMPLING_SEQ: usize = 410; // nADCSamplingSeq, [i16; 16]
pub(crate) const V1_ADC_CHANNEL_NAME: usize = 442; // sADCChannelName, [[u8; 10]; 16]
pub(crate) const V1_ADC_UNITS: usize = 602; // sADCUnits, [[u8; 8]; 16]
pub(crate) const V1_PROGRAMMABLE_GAIN: usize = 730; // fADCProgrammableGain, [f32; 16]
pub(crate) const V1_INSTRUMENT_SCALE: usize = 922; // fInstrumentScaleFactor, [f32; 16]
pub(crate) const V1_INSTRUMENT_OFFSET: usize = 986; // fInstrumentOffset, [f32; 16]
pub(crate) const V1_SIGNAL_GAIN: usize = 1050; // fSignalGain, [f32; 16]
pub(crate) const V1_SIGNAL_OFFSET: usize = 1114; // fSignalOffset, [f32; 16]
pub(crate) const V1_TELEGRAPH_ENABLE: usize = 4512; // nTelegraphEnable, [i16; 16]
pub(crate) const V1_TELEGRAPH_GAIN: usize = 4576; // fTelegraphAdditGain, [f32; 16]
pub(crate) const V1_HEADER_LEN: usize = 6144; // extended 1.8x header (12 blocks)

// ABF2 file-info layout (fixed part before the section map)
pub(crate) const V2_FILE_VERSION: usize = 4; // uFileVersionNumber, [u8; 4], low-to-high
pub(crate) const V2_ACTUAL_EPISODES: usize = 12; // uActualEpisodes, u32
pub(crate) const V2_DATA_FORMAT: usize = 30; // nDataFormat, u16
pub(crate) const V2_FILE_GUID: usize = 40; // FileGUID, [u8; 16]

/// Contains the ABF generation, data layout, and sweep bookkeeping for an open file
///
/// The header is the first segment of an ABF file and determines everything
/// needed to find and decode the DATA section:
/// - The file generation (v1 fixed-offset header vs. v2 section map)
/// - The sample storage format (int16 counts or float32)
/// - The byte offset and length of the DATA section
/// - The number of recorded episodes (sweeps)
#[derive(Clone, Debug, Serialize)]
pub struct Header {
    pub version: AbfVersion,
    /// Numeric file version, e.g. 1.83 or 2.0
    pub file_version: f32,
    pub data_format: AbfDataFormat,
    /// Byte offset of the first sample of the DATA section
    pub data_start: usize,
    /// Total stored samples across all channels and sweeps
    pub total_samples: usize,
    /// `lActualEpisodes` / `uActualEpisodes`; 0 or 1 for gap-free records
    pub actual_episodes: usize,
    /// File GUID (ABF2 only; `None` when absent or all zero)
    pub guid: Option<GuidString>,
    /// ABF2 section map (`None` for v1 files)
    #[serde(skip)]
    pub sections: Option<SectionMap>,
}

pub type GuidString = String;

impl Header {
    /// Returns a new Header struct from a memory map of an ABF file
    /// # Errors
    /// Will return `Err` if:
    /// - the file is too short to hold a header
    /// - the signature is not a valid ABF signature
    /// - the data format code is invalid
    /// - the DATA section location cannot be determined
    pub fn from_mmap(mmap: &Mmap) -> Result<Self> {
        if mmap.len() < 8 {
            return Err(anyhow!(
                "File too short to be an ABF file ({} bytes)",
                mmap.len()
            ));
        }
        let version = AbfVersion::from_signature(&mmap[..4])?;
        match version {
            AbfVersion::V1 => Self::from_v1_mmap(mmap),
            AbfVersion::V2 => Self::from_v2_mmap(mmap),
        }
    }

    fn from_v1_mmap(mmap: &Mmap) -> Result<Self> {
        let file_version = read_f32(mmap, V1_FILE_VERSION)?;
        let data_format = AbfDataFormat::from_format_code(read_i16(mmap, V1_DATA_FORMAT)?)?;
        let data_block = read_i32(mmap, V1_DATA_SECTION_PTR)?;
        if data_block <= 0 {
            return Err(anyhow!("Invalid DATA section pointer: {}", data_block));
        }
        let total_samples = read_i32(mmap, V1_ACTUAL_ACQ_LENGTH)?;
        if total_samples <= 0 {
            return Err(anyhow!("Invalid lActualAcqLength: {}", total_samples));
        }

        Ok(Self {
            version: AbfVersion::V1,
            file_version,
            data_format,
            data_start: data_block as usize * BLOCK_SIZE,
            total_samples: total_samples as usize,
            actual_episodes: read_i32(mmap, V1_ACTUAL_EPISODES)?.max(0) as usize,
            guid: None,
            sections: None,
        })
    }

    fn from_v2_mmap(mmap: &Mmap) -> Result<Self> {
        // Version bytes are stored low-to-high: [build, daily, minor, major]
        let version_bytes = slice(mmap, V2_FILE_VERSION, 4)?;
        let file_version = f32::from(version_bytes[3]) + f32::from(version_bytes[2]) / 10.0;

        let data_format =
            AbfDataFormat::from_format_code(read_u16(mmap, V2_DATA_FORMAT)? as i16)?;
        let sections = SectionMap::from_mmap(mmap)?;
        let data = &sections.data;
        if data.is_empty() {
            return Err(anyhow!("ABF2 file has an empty DATA section"));
        }

        Ok(Self {
            version: AbfVersion::V2,
            file_version,
            data_format,
            data_start: data.byte_start(),
            total_samples: data.entry_count,
            actual_episodes: read_u32(mmap, V2_ACTUAL_EPISODES)? as usize,
            guid: Self::read_guid(mmap)?,
            sections: Some(sections),
        })
    }

    /// Parse the 16-byte file GUID, treating an all-zero field as absent
    fn read_guid(mmap: &Mmap) -> Result<Option<GuidString>> {
        let bytes = slice(mmap, V2_FILE_GUID, 16)?;
        if bytecount::count(bytes, 0) == 16 {
            return Ok(None);
        }
        let mut guid = [0u8; 16];
        guid.copy_from_slice(bytes);
        Ok(Some(Uuid::from_bytes(guid).to_string()))
    }

    /// Number of sweeps in the record
    ///
    /// Gap-free and oscilloscope records are a single sweep covering the
    /// whole acquisition; episodic records use the recorded episode count.
    #[must_use]
    pub fn sweep_count(&self) -> usize {
        self.actual_episodes.max(1)
    }
}

/// Bounds-checked sub-slice of the memory map
/// # Errors
/// Will return `Err` if `offset + len` runs past the end of the file
pub(crate) fn slice(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    bytes.get(offset..offset + len).ok_or_else(|| {
        anyhow!(
            "Truncated ABF file: needed bytes {}..{} but file is {} bytes",
            offset,
            offset + len,
            bytes.len()
        )
    })
}

// ABF files are always little-endian; these helpers bounds-check before decoding.
pub(crate) fn read_i16(bytes: &[u8], offset: usize) -> Result<i16> {
    Ok(LE::read_i16(slice(bytes, offset, 2)?))
}

pub(crate) fn read_u16(bytes: &[u8], offset: usize) -> Result<u16> {
    Ok(LE::read_u16(slice(bytes, offset, 2)?))
}

pub(crate) fn read_i32(bytes: &[u8], offset: usize) -> Result<i32> {
    Ok(LE::read_i32(slice(bytes, offset, 4)?))
}

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    Ok(LE::read_u32(slice(bytes, offset, 4)?))
}

pub(crate) fn read_i64(bytes: &[u8], offset: usize) -> Result<i64> {
    Ok(LE::read_i64(slice(bytes, offset, 8)?))
}

pub(crate) fn read_f32(bytes: &[u8], offset: usize) -> Result<f32> {
    Ok(LE::read_f32(slice(bytes, offset, 4)?))
}

/// Trim the NUL/space padding Clampex leaves in fixed-width string fields
pub(crate) fn trim_padded_str(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(['\0', ' '])
        .to_string()
}
