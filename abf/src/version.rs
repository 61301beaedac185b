use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two generations of the Axon Binary Format
///
/// ABF1 files (Clampex 9 and earlier) start with the signature `"ABF "` and
/// keep every field at a fixed offset inside a single header block. ABF2
/// files (Clampex 10+) start with `"ABF2"` and describe their layout through
/// a section map instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbfVersion {
    V1,
    V2,
}

impl AbfVersion {
    /// Determine the file generation from the 4-byte signature at the start of the file
    /// # Errors
    /// Will return `Err` if the signature is neither `"ABF "` nor `"ABF2"`
    pub fn from_signature(signature: &[u8]) -> Result<Self> {
        match signature {
            b"ABF " => Ok(Self::V1),
            b"ABF2" => Ok(Self::V2),
            other => Err(anyhow!(
                "Invalid ABF signature: {:?} (expected \"ABF \" or \"ABF2\")",
                String::from_utf8_lossy(other)
            )),
        }
    }

    /// The 4-byte signature written at the start of files of this generation
    #[must_use]
    pub const fn signature(&self) -> &'static [u8; 4] {
        match self {
            Self::V1 => b"ABF ",
            Self::V2 => b"ABF2",
        }
    }
}

impl fmt::Display for AbfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "ABF v1"),
            Self::V2 => write!(f, "ABF v2"),
        }
    }
}
