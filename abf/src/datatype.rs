use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// How samples are stored in the DATA section (`nDataFormat` keyword)
///
/// Integer files store raw ADC counts that must be scaled to physical units
/// through the per-channel gain chain; float files store already-scaled
/// values.
#[derive(Default, Display, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum AbfDataFormat {
    /// 16-bit signed ADC counts (`nDataFormat = 0`), scaled on load
    #[default]
    Int16,
    /// 32-bit IEEE floats (`nDataFormat = 1`), stored in physical units
    Float32,
}

impl AbfDataFormat {
    /// Matches the `nDataFormat` header value and returns the corresponding format
    /// # Errors
    /// Will return `Err` for any value other than 0 (int16) or 1 (float32)
    pub fn from_format_code(code: i16) -> Result<Self> {
        match code {
            0 => Ok(Self::Int16),
            1 => Ok(Self::Float32),
            _ => Err(anyhow!("Invalid nDataFormat code: {}", code)),
        }
    }

    /// The `nDataFormat` header value for this format
    #[must_use]
    pub const fn format_code(&self) -> i16 {
        match self {
            Self::Int16 => 0,
            Self::Float32 => 1,
        }
    }

    /// Bytes per stored sample
    #[must_use]
    pub const fn bytes_per_sample(&self) -> usize {
        match self {
            Self::Int16 => 2,
            Self::Float32 => 4,
        }
    }
}
