//! `UnityFS` bundle writer
//!
//! Rebuilds a bundle after its data stream was patched. Blocks that do not
//! overlap a dirty range are copied byte-for-byte from the original file;
//! only touched blocks are recompressed.

use std::ops::Range;

use byteorder::{BigEndian, WriteBytesExt};

use crate::error::{Error, Result};

use super::{BundleArchive, BundleCompression, BundleHeader, BundleNode, SIGNATURE, StorageBlock};

/// A rebuilt bundle file and the block table it was written with.
pub struct RebuiltBundle {
    pub bytes: Vec<u8>,
    pub archive: BundleArchive,
}

/// Rebuild `archive` with `stream` as its new data stream.
///
/// `original` is the current bundle file; `dirty` lists stream ranges that
/// changed since it was read.
pub fn rebuild_bundle(
    archive: &BundleArchive,
    original: &[u8],
    stream: &[u8],
    dirty: &[Range<usize>],
) -> Result<RebuiltBundle> {
    if stream.len() != archive.stream_len() {
        return Err(Error::Corrupt {
            offset: 0,
            message: format!(
                "data stream is {} bytes, blocks cover {}",
                stream.len(),
                archive.stream_len()
            ),
        });
    }

    let mut blocks = Vec::with_capacity(archive.blocks.len());
    let mut payloads: Vec<Vec<u8>> = Vec::with_capacity(archive.blocks.len());
    for (block, range) in archive.blocks.iter().zip(archive.block_ranges()) {
        let touched = dirty
            .iter()
            .any(|d| d.start < range.end && range.start < d.end);
        let payload = if touched {
            compress(&stream[range], block.compression())?
        } else {
            let start = block.file_offset as usize;
            original
                .get(start..start + block.compressed_size as usize)
                .ok_or_else(|| Error::Corrupt {
                    offset: start,
                    message: "storage block past end of original file".to_string(),
                })?
                .to_vec()
        };
        blocks.push(StorageBlock {
            uncompressed_size: block.uncompressed_size,
            compressed_size: u32::try_from(payload.len()).map_err(|_| Error::Corrupt {
                offset: 0,
                message: "recompressed block exceeds 4 GiB".to_string(),
            })?,
            flags: block.flags,
            file_offset: 0,
        });
        payloads.push(payload);
    }

    let info_raw = write_block_info(&archive.data_hash, &blocks, &archive.nodes)?;
    let info = compress(&info_raw, archive.header.info_compression())?;

    let mut header = archive.header.clone();
    header.compressed_info_size = info.len() as u32;
    header.uncompressed_info_size = info_raw.len() as u32;

    let mut out = Vec::with_capacity(original.len());
    write_header(&mut out, &header)?;
    let size_field = out.len() - 20;
    if header.version >= 7 {
        pad_to(&mut out, 16);
    }
    if !header.info_at_end() {
        out.extend_from_slice(&info);
    }
    if header.pads_before_blocks() {
        pad_to(&mut out, 16);
    }
    for (block, payload) in blocks.iter_mut().zip(&payloads) {
        block.file_offset = out.len() as u64;
        out.extend_from_slice(payload);
    }
    if header.info_at_end() {
        out.extend_from_slice(&info);
    }

    header.size = out.len() as u64;
    out[size_field..size_field + 8].copy_from_slice(&(header.size as i64).to_be_bytes());

    Ok(RebuiltBundle {
        bytes: out,
        archive: BundleArchive {
            header,
            data_hash: archive.data_hash,
            blocks,
            nodes: archive.nodes.clone(),
        },
    })
}

/// Serialize a header; the size field is patched by the caller.
fn write_header(out: &mut Vec<u8>, header: &BundleHeader) -> Result<()> {
    out.extend_from_slice(SIGNATURE);
    out.write_u32::<BigEndian>(header.version)?;
    write_cstr(out, &header.unity_version);
    write_cstr(out, &header.unity_revision);
    out.write_i64::<BigEndian>(header.size as i64)?;
    out.write_u32::<BigEndian>(header.compressed_info_size)?;
    out.write_u32::<BigEndian>(header.uncompressed_info_size)?;
    out.write_u32::<BigEndian>(header.flags)?;
    Ok(())
}

/// Serialize the block and node tables (uncompressed).
pub fn write_block_info(
    data_hash: &[u8; 16],
    blocks: &[StorageBlock],
    nodes: &[BundleNode],
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(data_hash);
    out.write_i32::<BigEndian>(blocks.len() as i32)?;
    for block in blocks {
        out.write_u32::<BigEndian>(block.uncompressed_size)?;
        out.write_u32::<BigEndian>(block.compressed_size)?;
        out.write_u16::<BigEndian>(block.flags)?;
    }
    out.write_i32::<BigEndian>(nodes.len() as i32)?;
    for node in nodes {
        out.write_i64::<BigEndian>(node.offset as i64)?;
        out.write_i64::<BigEndian>(node.size as i64)?;
        out.write_u32::<BigEndian>(node.flags)?;
        write_cstr(&mut out, &node.path);
    }
    Ok(out)
}

/// Compress with the method a block or info table was stored with.
pub fn compress(data: &[u8], method: BundleCompression) -> Result<Vec<u8>> {
    match method {
        BundleCompression::None => Ok(data.to_vec()),
        // lz4_flex emits plain LZ4 blocks; LZ4HC readers accept them unchanged.
        BundleCompression::Lz4 | BundleCompression::Lz4Hc => Ok(lz4_flex::block::compress(data)),
        other => Err(Error::UnsupportedCompression {
            method: other.as_str().to_string(),
        }),
    }
}

fn write_cstr(out: &mut Vec<u8>, text: &str) {
    out.extend_from_slice(text.as_bytes());
    out.push(0);
}

fn pad_to(out: &mut Vec<u8>, alignment: usize) {
    let padded = out.len().div_ceil(alignment) * alignment;
    out.resize(padded, 0);
}
