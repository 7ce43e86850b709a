//! `UnityFS` bundle reader

use crate::error::{Error, Result};
use crate::utils::BinaryReader;

use super::{
    BundleArchive, BundleCompression, BundleHeader, BundleNode, MAX_VERSION, MIN_VERSION,
    SIGNATURE, StorageBlock,
};

/// Parse a bundle and decompress its data stream.
///
/// Returns the archive structure and the concatenated block contents.
pub fn read_bundle(data: &[u8]) -> Result<(BundleArchive, Vec<u8>)> {
    let mut reader = BinaryReader::new(data, true);
    let header = read_header(&mut reader)?;

    if header.version >= 7 {
        reader.align(16)?;
    }
    let header_end = reader.position();

    let info_offset = if header.info_at_end() {
        data.len()
            .checked_sub(header.compressed_info_size as usize)
            .ok_or_else(|| Error::Corrupt {
                offset: 0,
                message: "block info larger than file".to_string(),
            })?
    } else {
        header_end
    };

    reader.seek(info_offset);
    let compressed_info = reader.read_bytes(header.compressed_info_size as usize)?;
    let info = decompress(
        compressed_info,
        header.uncompressed_info_size as usize,
        header.info_compression(),
    )?;

    let mut blocks_start = if header.info_at_end() {
        header_end
    } else {
        header_end + header.compressed_info_size as usize
    };
    if header.pads_before_blocks() {
        blocks_start = blocks_start.div_ceil(16) * 16;
    }

    let (data_hash, mut blocks, nodes) = read_block_info(&info)?;

    let mut file_offset = blocks_start as u64;
    for block in &mut blocks {
        block.file_offset = file_offset;
        file_offset += u64::from(block.compressed_size);
    }

    let archive = BundleArchive {
        header,
        data_hash,
        blocks,
        nodes,
    };

    let mut stream = Vec::with_capacity(archive.stream_len());
    for block in &archive.blocks {
        let start = block.file_offset as usize;
        let raw = data
            .get(start..start + block.compressed_size as usize)
            .ok_or_else(|| Error::Corrupt {
                offset: start,
                message: "storage block past end of file".to_string(),
            })?;
        let chunk = decompress(raw, block.uncompressed_size as usize, block.compression())?;
        stream.extend_from_slice(&chunk);
    }

    for node in &archive.nodes {
        if node.offset + node.size > stream.len() as u64 {
            return Err(Error::Corrupt {
                offset: 0,
                message: format!("node '{}' extends past data stream", node.path),
            });
        }
    }

    tracing::debug!(
        "UnityFS v{} ({}), {} blocks, {} nodes, {} bytes decompressed",
        archive.header.version,
        archive.header.unity_revision,
        archive.blocks.len(),
        archive.nodes.len(),
        stream.len()
    );

    Ok((archive, stream))
}

/// Whether `data` starts with the `UnityFS` signature.
pub fn is_bundle(data: &[u8]) -> bool {
    data.starts_with(SIGNATURE)
}

fn read_header(reader: &mut BinaryReader<'_>) -> Result<BundleHeader> {
    let signature = reader.read_bytes(SIGNATURE.len())?;
    if signature != SIGNATURE {
        return Err(Error::Corrupt {
            offset: 0,
            message: "missing UnityFS signature".to_string(),
        });
    }

    let version = reader.read_u32()?;
    if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
        return Err(Error::UnsupportedContainerVersion {
            kind: "UnityFS",
            version,
        });
    }

    let unity_version = reader.read_cstr()?;
    let unity_revision = reader.read_cstr()?;
    let size = reader.read_i64()?;
    let compressed_info_size = reader.read_u32()?;
    let uncompressed_info_size = reader.read_u32()?;
    let flags = reader.read_u32()?;

    Ok(BundleHeader {
        version,
        unity_version,
        unity_revision,
        size: u64::try_from(size).unwrap_or(0),
        compressed_info_size,
        uncompressed_info_size,
        flags,
    })
}

fn read_block_info(info: &[u8]) -> Result<([u8; 16], Vec<StorageBlock>, Vec<BundleNode>)> {
    let mut reader = BinaryReader::new(info, true);
    let data_hash = reader.read_array::<16>()?;

    let block_count = reader.read_len()?;
    let mut blocks = Vec::with_capacity(block_count.min(reader.remaining() / 10));
    for _ in 0..block_count {
        blocks.push(StorageBlock {
            uncompressed_size: reader.read_u32()?,
            compressed_size: reader.read_u32()?,
            flags: reader.read_u16()?,
            file_offset: 0,
        });
    }

    let node_count = reader.read_len()?;
    let mut nodes = Vec::with_capacity(node_count.min(reader.remaining() / 20));
    for _ in 0..node_count {
        let offset = reader.read_i64()?;
        let size = reader.read_i64()?;
        let flags = reader.read_u32()?;
        let path = reader.read_cstr()?;
        let (Ok(offset), Ok(size)) = (u64::try_from(offset), u64::try_from(size)) else {
            return Err(Error::Corrupt {
                offset: reader.position(),
                message: format!("node '{path}' has a negative extent"),
            });
        };
        nodes.push(BundleNode {
            offset,
            size,
            flags,
            path,
        });
    }

    Ok((data_hash, blocks, nodes))
}

/// Decompress one block-info table or storage block.
pub(super) fn decompress(
    data: &[u8],
    uncompressed_size: usize,
    method: BundleCompression,
) -> Result<Vec<u8>> {
    match method {
        BundleCompression::None => Ok(data.to_vec()),
        BundleCompression::Lz4 | BundleCompression::Lz4Hc => {
            let out = lz4_flex::block::decompress(data, uncompressed_size)?;
            if out.len() != uncompressed_size {
                return Err(Error::Corrupt {
                    offset: 0,
                    message: format!(
                        "LZ4 block produced {} bytes, expected {uncompressed_size}",
                        out.len()
                    ),
                });
            }
            Ok(out)
        }
        other => Err(Error::UnsupportedCompression {
            method: other.as_str().to_string(),
        }),
    }
}
