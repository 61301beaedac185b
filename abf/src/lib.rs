use std::path::PathBuf;

pub use channel::{AdcChannel, ChannelMap, ChannelName};
pub use datatype::AbfDataFormat;
pub use file::Abf;
pub use header::Header;
pub use protocol::{AcquisitionProtocol, OperationMode};
pub use section::SectionMap;
pub use version::AbfVersion;
pub use write::{AbfWriteSpec, write_abf1_file, write_abf2_file};

pub mod channel;
pub mod datatype;
pub mod file;
pub mod header;
pub mod protocol;
pub mod section;
mod tests;
pub mod version;
pub mod write;

pub type GUID = String;
pub type FilePath = PathBuf;
pub type SampleCount = usize;

/// Label for sweep `n` (1-based), e.g. `sweep001`
///
/// Zero-padded to three digits; widens naturally past 999.
#[must_use]
pub fn sweep_label(n: usize) -> String {
    format!("sweep{n:03}")
}
