//! `SerializedFile` header

use crate::error::{Error, Result};
use crate::utils::BinaryReader;

pub const MIN_VERSION: u32 = 9;
pub const MAX_VERSION: u32 = 23;

/// Version that widened header offsets to 64 bits.
pub const LARGE_FILES_VERSION: u32 = 22;

/// Fixed-size header at the start of every serialized file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializedHeader {
    pub metadata_size: u32,
    pub file_size: u64,
    pub version: u32,
    pub data_offset: u64,
    /// Byte order of metadata and object data.
    pub big_endian: bool,
}

impl SerializedHeader {
    /// Size of the header on disk, where metadata begins.
    pub fn header_size(&self) -> usize {
        if self.version >= LARGE_FILES_VERSION { 48 } else { 20 }
    }

    /// Read and sanity-check the header against the buffer it came from.
    pub fn read(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data, true);
        let metadata_size = reader.read_u32()?;
        let file_size = u64::from(reader.read_u32()?);
        let version = reader.read_u32()?;
        let data_offset = u64::from(reader.read_u32()?);

        if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
            return Err(Error::UnsupportedContainerVersion {
                kind: "serialized file",
                version,
            });
        }

        let big_endian = reader.read_u8()? != 0;
        reader.skip(3)?;

        let mut header = Self {
            metadata_size,
            file_size,
            version,
            data_offset,
            big_endian,
        };

        if version >= LARGE_FILES_VERSION {
            header.metadata_size = reader.read_u32()?;
            header.file_size = reader.read_u64()?;
            header.data_offset = reader.read_u64()?;
            reader.skip(8)?;
        }

        header.validate(data.len())?;
        Ok(header)
    }

    fn validate(&self, actual_len: usize) -> Result<()> {
        let corrupt = |message: String| Error::Corrupt { offset: 0, message };
        if self.file_size != actual_len as u64 {
            return Err(corrupt(format!(
                "declared size {} does not match {actual_len} bytes",
                self.file_size
            )));
        }
        if self.data_offset > self.file_size {
            return Err(corrupt(format!(
                "data offset {} beyond end of file",
                self.data_offset
            )));
        }
        if self.header_size() as u64 + u64::from(self.metadata_size) > self.file_size {
            return Err(corrupt(format!(
                "metadata size {} exceeds file",
                self.metadata_size
            )));
        }
        Ok(())
    }

    /// Cheap check used to sniff serialized files without parsing metadata.
    pub fn looks_like(data: &[u8]) -> bool {
        Self::read(data).is_ok()
    }
}
