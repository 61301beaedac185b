use super::header::{BLOCK_SIZE, read_i64, read_u32, slice};
use anyhow::{Result, anyhow};
use memmap3::Mmap;
use serde::Serialize;

/// Byte offset of the first section-map entry in an ABF2 file
const SECTION_MAP_START: usize = 76;
/// Each section-map entry is 16 bytes: block index (u32), entry bytes (u32), entry count (i64)
const SECTION_ENTRY_LEN: usize = 16;

/// Location and shape of one ABF2 section
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct Section {
    /// 512-byte block index of the section start
    pub block_index: usize,
    /// Bytes per entry within the section
    pub entry_bytes: usize,
    /// Number of entries stored in the section
    pub entry_count: usize,
}

impl Section {
    fn from_mmap(mmap: &Mmap, map_slot: usize) -> Result<Self> {
        let offset = SECTION_MAP_START + map_slot * SECTION_ENTRY_LEN;
        let entry_count = read_i64(mmap, offset + 8)?;
        if entry_count < 0 {
            return Err(anyhow!(
                "Negative entry count {} in section map slot {}",
                entry_count,
                map_slot
            ));
        }
        Ok(Self {
            block_index: read_u32(mmap, offset)? as usize,
            entry_bytes: read_u32(mmap, offset + 4)? as usize,
            entry_count: entry_count as usize,
        })
    }

    /// Byte offset of the section start
    #[must_use]
    pub const fn byte_start(&self) -> usize {
        self.block_index * BLOCK_SIZE
    }

    /// Byte offset of entry `index` within the section
    #[must_use]
    pub const fn entry_start(&self, index: usize) -> usize {
        self.byte_start() + index * self.entry_bytes
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.block_index == 0 || self.entry_count == 0
    }
}

/// The ABF2 section map: 16-byte entries starting at byte 76
///
/// ABF2 files replace the v1 fixed header with a table of (block index,
/// entry size, entry count) triples, one per section, in a fixed order.
/// Only the sections this crate reads are named; the remaining slots exist
/// in the file but carry nothing we consume.
#[derive(Clone, Debug, Serialize)]
pub struct SectionMap {
    pub protocol: Section,
    pub adc: Section,
    pub strings: Section,
    pub data: Section,
    pub tag: Section,
    pub synch_array: Section,
}

impl SectionMap {
    /// Read the section map from an ABF2 memory map
    /// # Errors
    /// Will return `Err` if the file is too short to hold the map or an entry is malformed
    pub fn from_mmap(mmap: &Mmap) -> Result<Self> {
        // Slot order in the file: Protocol, ADC, DAC, Epoch, ADCPerDAC,
        // EpochPerDAC, UserList, StatsRegion, Math, Strings, Data, Tag,
        // Scope, Delta, VoiceTag, SynchArray, Annotation, Stats.
        Ok(Self {
            protocol: Section::from_mmap(mmap, 0)?,
            adc: Section::from_mmap(mmap, 1)?,
            strings: Section::from_mmap(mmap, 9)?,
            data: Section::from_mmap(mmap, 10)?,
            tag: Section::from_mmap(mmap, 11)?,
            synch_array: Section::from_mmap(mmap, 15)?,
        })
    }
}

/// Read the indexed string table from the Strings section
///
/// The table is a run of NUL-terminated strings; keywords such as
/// `lADCChannelNameIndex` are 1-based indices into it, with index 0 meaning
/// "no string". Splitting is done with memchr over the whole section.
///
/// # Errors
/// Will return `Err` if the section runs past the end of the file
pub fn read_indexed_strings(mmap: &Mmap, strings: &Section) -> Result<Vec<String>> {
    if strings.is_empty() {
        return Ok(Vec::new());
    }
    let total = strings.entry_bytes * strings.entry_count.max(1);
    let blob = slice(mmap, strings.byte_start(), total)?;

    let mut table = Vec::new();
    let mut prev = 0usize;
    for pos in memchr::memchr_iter(0, blob) {
        table.push(String::from_utf8_lossy(&blob[prev..pos]).to_string());
        prev = pos + 1;
    }
    Ok(table)
}

/// Look up a 1-based string-table index, treating 0 and out-of-range as absent
#[must_use]
pub fn indexed_string(table: &[String], index: usize) -> Option<&str> {
    if index == 0 {
        return None;
    }
    table.get(index).map(String::as_str).filter(|s| !s.is_empty())
}
