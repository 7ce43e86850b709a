//! Types for `UnityFS` bundle handling

use std::ops::Range;

/// Mask selecting the compression method from header and block flags.
pub const COMPRESSION_MASK: u32 = 0x3F;
/// Block info is stored after the block data instead of after the header.
pub const FLAG_INFO_AT_END: u32 = 0x80;
/// Block data starts on a 16-byte boundary after the block info.
pub const FLAG_PAD_BEFORE_BLOCKS: u32 = 0x200;
/// Node holds a serialized file.
pub const NODE_FLAG_SERIALIZED: u32 = 0x4;

/// Compression method of the block info or a storage block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleCompression {
    None,
    Lzma,
    Lz4,
    Lz4Hc,
    Lzham,
    Unknown(u32),
}

impl BundleCompression {
    pub fn from_flags(flags: u32) -> Self {
        match flags & COMPRESSION_MASK {
            0 => Self::None,
            1 => Self::Lzma,
            2 => Self::Lz4,
            3 => Self::Lz4Hc,
            4 => Self::Lzham,
            other => Self::Unknown(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lzma => "lzma",
            Self::Lz4 => "lz4",
            Self::Lz4Hc => "lz4hc",
            Self::Lzham => "lzham",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Fixed header at the start of a bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleHeader {
    /// Archive format version (6-8)
    pub version: u32,
    pub unity_version: String,
    pub unity_revision: String,
    /// Total file size as declared
    pub size: u64,
    pub compressed_info_size: u32,
    pub uncompressed_info_size: u32,
    pub flags: u32,
}

impl BundleHeader {
    pub fn info_compression(&self) -> BundleCompression {
        BundleCompression::from_flags(self.flags)
    }

    pub fn info_at_end(&self) -> bool {
        self.flags & FLAG_INFO_AT_END != 0
    }

    pub fn pads_before_blocks(&self) -> bool {
        self.flags & FLAG_PAD_BEFORE_BLOCKS != 0
    }
}

/// A compressed chunk of the bundle's data stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageBlock {
    pub uncompressed_size: u32,
    pub compressed_size: u32,
    pub flags: u16,
    /// Where the compressed bytes start in the bundle file (not serialized)
    pub file_offset: u64,
}

impl StorageBlock {
    pub fn compression(&self) -> BundleCompression {
        BundleCompression::from_flags(u32::from(self.flags))
    }
}

/// A file stored in the bundle's data stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleNode {
    /// Offset in the decompressed data stream
    pub offset: u64,
    pub size: u64,
    pub flags: u32,
    /// e.g. `CAB-0123abcd` or `CAB-0123abcd.resS`
    pub path: String,
}

impl BundleNode {
    pub fn is_serialized_file(&self) -> bool {
        self.flags & NODE_FLAG_SERIALIZED != 0
    }

    /// Range of this node in the decompressed data stream.
    pub fn range(&self) -> Range<usize> {
        self.offset as usize..(self.offset + self.size) as usize
    }
}

/// Parsed bundle structure, without the data stream itself
#[derive(Debug, Clone)]
pub struct BundleArchive {
    pub header: BundleHeader,
    pub data_hash: [u8; 16],
    pub blocks: Vec<StorageBlock>,
    pub nodes: Vec<BundleNode>,
}

impl BundleArchive {
    /// Ranges of each block in the decompressed data stream, in order.
    pub fn block_ranges(&self) -> Vec<Range<usize>> {
        let mut start = 0usize;
        self.blocks
            .iter()
            .map(|block| {
                let end = start + block.uncompressed_size as usize;
                let range = start..end;
                start = end;
                range
            })
            .collect()
    }

    /// Total decompressed size of all blocks.
    pub fn stream_len(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| b.uncompressed_size as usize)
            .sum()
    }
}
