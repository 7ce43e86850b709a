//! Synthetic Unity containers for integration tests
//!
//! Builds format-21 serialized files, with or without type trees (game
//! builds usually strip them, bundles usually keep them), `.resS` streams
//! and LZ4 `UnityFS` bundles.

#![allow(dead_code, clippy::cast_possible_truncation)]

use std::path::{Path, PathBuf};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use unitex::formats::bundle::{
    BundleCompression, BundleNode, NODE_FLAG_SERIALIZED, SIGNATURE, StorageBlock, compress,
    write_block_info,
};

pub const UNITY_VERSION: &str = "2019.4.31f1";

pub const FORMAT_ALPHA8: i32 = 1;
pub const FORMAT_RGB24: i32 = 3;
pub const FORMAT_RGBA32: i32 = 4;
pub const FORMAT_DXT1: i32 = 10;
pub const FORMAT_ETC2_RGBA8: i32 = 47;

const CLASS_TEXTURE2D: i32 = 28;

/// Where a texture's pixels are stored.
#[derive(Debug, Clone)]
pub enum Pixels {
    Inline(Vec<u8>),
    /// `m_StreamData`: offset, size and path of the referenced stream.
    Streamed { offset: u64, size: u32, path: String },
}

#[derive(Debug, Clone)]
pub struct TextureSpec {
    pub path_id: i64,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: i32,
    pub mip_count: i32,
    pub pixels: Pixels,
}

impl TextureSpec {
    pub fn inline(path_id: i64, name: &str, width: u32, height: u32, format: i32, pixels: Vec<u8>) -> Self {
        Self {
            path_id,
            name: name.to_string(),
            width,
            height,
            format,
            mip_count: 1,
            pixels: Pixels::Inline(pixels),
        }
    }

    pub fn streamed(
        path_id: i64,
        name: &str,
        width: u32,
        height: u32,
        format: i32,
        offset: u64,
        size: u32,
        path: &str,
    ) -> Self {
        Self {
            path_id,
            name: name.to_string(),
            width,
            height,
            format,
            mip_count: 1,
            pixels: Pixels::Streamed {
                offset,
                size,
                path: path.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub enum ObjectSpec {
    Texture(TextureSpec),
    /// Any other class, with opaque payload bytes.
    Other { path_id: i64, class_id: i32, bytes: Vec<u8> },
}

impl ObjectSpec {
    fn path_id(&self) -> i64 {
        match self {
            Self::Texture(t) => t.path_id,
            Self::Other { path_id, .. } => *path_id,
        }
    }

    fn class_id(&self) -> i32 {
        match self {
            Self::Texture(_) => CLASS_TEXTURE2D,
            Self::Other { class_id, .. } => *class_id,
        }
    }

    fn payload(&self, type_trees: bool) -> Vec<u8> {
        match self {
            Self::Texture(t) => texture_payload(t, type_trees),
            Self::Other { bytes, .. } => bytes.clone(),
        }
    }
}

/// Deterministic pixel bytes.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

fn aligned_string(out: &mut Vec<u8>, text: &str) {
    out.write_i32::<LittleEndian>(text.len() as i32).unwrap();
    out.extend_from_slice(text.as_bytes());
    pad4(out);
}

/// Texture2D object bytes in the 2019.4 player layout.
///
/// `wide_offset` stores `m_StreamData.offset` as 64 bits, the way the
/// type tree from [`texture_type_tree`] declares it.
fn texture_payload(spec: &TextureSpec, wide_offset: bool) -> Vec<u8> {
    let (inline, stream) = match &spec.pixels {
        Pixels::Inline(bytes) => (bytes.as_slice(), None),
        Pixels::Streamed { offset, size, path } => (&[][..], Some((*offset, *size, path.as_str()))),
    };
    let complete = match &spec.pixels {
        Pixels::Inline(bytes) => bytes.len() as i32,
        Pixels::Streamed { size, .. } => *size as i32,
    };

    let mut out = Vec::new();
    aligned_string(&mut out, &spec.name);
    out.write_i32::<LittleEndian>(1).unwrap(); // forced fallback format
    out.extend_from_slice(&[0, 0, 0, 0]); // downscale fallback + align
    out.write_i32::<LittleEndian>(spec.width as i32).unwrap();
    out.write_i32::<LittleEndian>(spec.height as i32).unwrap();
    out.write_i32::<LittleEndian>(complete).unwrap();
    out.write_i32::<LittleEndian>(spec.format).unwrap();
    out.write_i32::<LittleEndian>(spec.mip_count).unwrap();
    out.extend_from_slice(&[1, 0, 0, 0]); // readable, ignore limit, streaming mips + align
    out.write_i32::<LittleEndian>(0).unwrap(); // streaming priority
    out.write_i32::<LittleEndian>(1).unwrap(); // image count
    out.write_i32::<LittleEndian>(2).unwrap(); // dimension
    out.write_i32::<LittleEndian>(1).unwrap(); // filter mode
    out.write_i32::<LittleEndian>(1).unwrap(); // aniso
    out.write_f32::<LittleEndian>(0.0).unwrap(); // mip bias
    out.extend_from_slice(&[0; 12]); // wrap u/v/w
    out.write_i32::<LittleEndian>(0).unwrap(); // lightmap format
    out.write_i32::<LittleEndian>(1).unwrap(); // color space
    out.write_i32::<LittleEndian>(inline.len() as i32).unwrap();
    out.extend_from_slice(inline);
    pad4(&mut out);
    let (offset, size, path) = stream.unwrap_or((0, 0, ""));
    if wide_offset {
        out.write_u64::<LittleEndian>(offset).unwrap();
    } else {
        out.write_u32::<LittleEndian>(offset as u32).unwrap();
    }
    out.write_u32::<LittleEndian>(size).unwrap();
    aligned_string(&mut out, path);
    out
}

const FLAG_ARRAY: u8 = 0x1;
const ALIGN: i32 = 0x4000;

/// `(level, type, name, type flags, meta flags)` of one type-tree node.
type TreeNode = (u8, &'static str, &'static str, u8, i32);

fn string_nodes(level: u8, name: &'static str) -> Vec<TreeNode> {
    vec![
        (level, "string", name, 0, 0),
        (level + 1, "Array", "Array", FLAG_ARRAY, ALIGN),
        (level + 2, "int", "size", 0, 0),
        (level + 2, "char", "data", 0, 0),
    ]
}

/// Texture2D layout matching [`texture_payload`] with a wide stream offset.
fn texture_type_tree() -> Vec<TreeNode> {
    let mut nodes = vec![(0, "Texture2D", "Base", 0, 0)];
    nodes.extend(string_nodes(1, "m_Name"));
    nodes.extend([
        (1, "int", "m_ForcedFallbackFormat", 0, 0),
        (1, "bool", "m_DownscaleFallback", 0, ALIGN),
        (1, "int", "m_Width", 0, 0),
        (1, "int", "m_Height", 0, 0),
        (1, "int", "m_CompleteImageSize", 0, 0),
        (1, "int", "m_TextureFormat", 0, 0),
        (1, "int", "m_MipCount", 0, 0),
        (1, "bool", "m_IsReadable", 0, 0),
        (1, "bool", "m_IgnoreMasterTextureLimit", 0, 0),
        (1, "bool", "m_StreamingMipmaps", 0, ALIGN),
        (1, "int", "m_StreamingMipmapsPriority", 0, 0),
        (1, "int", "m_ImageCount", 0, 0),
        (1, "int", "m_TextureDimension", 0, 0),
        (1, "GLTextureSettings", "m_TextureSettings", 0, 0),
        (2, "int", "m_FilterMode", 0, 0),
        (2, "int", "m_Aniso", 0, 0),
        (2, "float", "m_MipBias", 0, 0),
        (2, "int", "m_WrapU", 0, 0),
        (2, "int", "m_WrapV", 0, 0),
        (2, "int", "m_WrapW", 0, 0),
        (1, "int", "m_LightmapFormat", 0, 0),
        (1, "int", "m_ColorSpace", 0, 0),
        (1, "TypelessData", "image data", FLAG_ARRAY, ALIGN),
        (2, "UInt8", "data", 0, 0),
        (1, "StreamingInfo", "m_StreamData", 0, 0),
        (2, "UInt64", "offset", 0, 0),
        (2, "unsigned int", "size", 0, 0),
    ]);
    nodes.extend(string_nodes(2, "path"));
    nodes
}

/// A type tree in the v21 blob form, names in the local string buffer.
fn type_tree_blob(nodes: &[TreeNode]) -> Vec<u8> {
    let mut strings: Vec<u8> = Vec::new();
    let mut offset_of = |text: &str| -> u32 {
        let needle: Vec<u8> = text.bytes().chain([0]).collect();
        if let Some(at) = strings.windows(needle.len()).position(|w| w == needle.as_slice()) {
            if at == 0 || strings[at - 1] == 0 {
                return at as u32;
            }
        }
        let at = strings.len() as u32;
        strings.extend_from_slice(&needle);
        at
    };

    let mut table = Vec::new();
    for (index, &(level, type_name, name, flags, meta)) in nodes.iter().enumerate() {
        table.write_u16::<LittleEndian>(1).unwrap();
        table.push(level);
        table.push(flags);
        table.write_u32::<LittleEndian>(offset_of(type_name)).unwrap();
        table.write_u32::<LittleEndian>(offset_of(name)).unwrap();
        table.write_i32::<LittleEndian>(-1).unwrap();
        table.write_i32::<LittleEndian>(index as i32).unwrap();
        table.write_i32::<LittleEndian>(meta).unwrap();
        table.write_u64::<LittleEndian>(0).unwrap();
    }

    let mut out = Vec::new();
    out.write_i32::<LittleEndian>(nodes.len() as i32).unwrap();
    out.write_i32::<LittleEndian>(strings.len() as i32).unwrap();
    out.extend_from_slice(&table);
    out.extend_from_slice(&strings);
    out
}

/// A little-endian format-21 serialized file holding `objects` in order.
pub fn serialized_file(objects: &[ObjectSpec]) -> Vec<u8> {
    build_serialized(objects, false)
}

/// Like [`serialized_file`], but carrying type trees: Texture2D gets its
/// full layout, other classes a bare root node.
pub fn serialized_file_with_type_trees(objects: &[ObjectSpec]) -> Vec<u8> {
    build_serialized(objects, true)
}

fn build_serialized(objects: &[ObjectSpec], type_trees: bool) -> Vec<u8> {
    let mut out = vec![0u8; 20];

    out.extend_from_slice(UNITY_VERSION.as_bytes());
    out.push(0);
    out.write_i32::<LittleEndian>(5).unwrap(); // StandaloneWindows
    out.push(u8::from(type_trees));

    let mut classes: Vec<i32> = Vec::new();
    for object in objects {
        if !classes.contains(&object.class_id()) {
            classes.push(object.class_id());
        }
    }
    out.write_i32::<LittleEndian>(classes.len() as i32).unwrap();
    for &class_id in &classes {
        out.write_i32::<LittleEndian>(class_id).unwrap();
        out.push(0); // stripped
        out.write_i16::<LittleEndian>(-1).unwrap();
        out.extend_from_slice(&[0; 16]); // type hash
        if type_trees {
            let nodes = if class_id == CLASS_TEXTURE2D {
                texture_type_tree()
            } else {
                vec![(0, "Object", "Base", 0, 0)]
            };
            out.extend_from_slice(&type_tree_blob(&nodes));
            out.write_i32::<LittleEndian>(0).unwrap(); // type dependencies
        }
    }

    let payloads: Vec<Vec<u8>> = objects.iter().map(|o| o.payload(type_trees)).collect();
    out.write_i32::<LittleEndian>(objects.len() as i32).unwrap();
    let mut relative = 0usize;
    for (object, payload) in objects.iter().zip(&payloads) {
        pad4(&mut out);
        out.write_i64::<LittleEndian>(object.path_id()).unwrap();
        out.write_u32::<LittleEndian>(relative as u32).unwrap();
        out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        let type_index = classes.iter().position(|&c| c == object.class_id()).unwrap();
        out.write_i32::<LittleEndian>(type_index as i32).unwrap();
        relative = (relative + payload.len()).div_ceil(8) * 8;
    }
    out.write_i32::<LittleEndian>(0).unwrap(); // script types
    out.write_i32::<LittleEndian>(0).unwrap(); // externals
    out.write_i32::<LittleEndian>(0).unwrap(); // ref types
    out.push(0); // user information

    let metadata_size = out.len() - 20;
    let data_offset = out.len().div_ceil(16) * 16;
    out.resize(data_offset, 0);
    for payload in &payloads {
        out.extend_from_slice(payload);
        out.resize(out.len().div_ceil(8) * 8, 0);
    }

    let file_size = out.len();
    let mut header = Vec::with_capacity(20);
    header.write_u32::<BigEndian>(metadata_size as u32).unwrap();
    header.write_u32::<BigEndian>(file_size as u32).unwrap();
    header.write_u32::<BigEndian>(21).unwrap();
    header.write_u32::<BigEndian>(data_offset as u32).unwrap();
    header.extend_from_slice(&[0, 0, 0, 0]);
    out[..20].copy_from_slice(&header);
    out
}

/// Concatenates texture payloads into a `.resS` stream, 16-byte aligned.
#[derive(Debug, Default)]
pub struct StreamBuilder {
    pub bytes: Vec<u8>,
}

impl StreamBuilder {
    /// Append `data` and return its offset.
    pub fn push(&mut self, data: &[u8]) -> u64 {
        let offset = self.bytes.len() as u64;
        self.bytes.extend_from_slice(data);
        self.bytes.resize(self.bytes.len().div_ceil(16) * 16, 0);
        offset
    }
}

/// One file stored in a bundle.
pub struct NodeSpec {
    pub path: String,
    pub bytes: Vec<u8>,
    pub serialized: bool,
}

/// An LZ4 `UnityFS` v7 bundle whose data stream is split into `block_size` blocks.
pub fn bundle(nodes: &[NodeSpec], block_size: usize) -> Vec<u8> {
    let mut stream = Vec::new();
    let mut entries = Vec::new();
    for node in nodes {
        entries.push(BundleNode {
            offset: stream.len() as u64,
            size: node.bytes.len() as u64,
            flags: if node.serialized { NODE_FLAG_SERIALIZED } else { 0 },
            path: node.path.clone(),
        });
        stream.extend_from_slice(&node.bytes);
    }

    let mut blocks = Vec::new();
    let mut payloads = Vec::new();
    for chunk in stream.chunks(block_size) {
        let payload = compress(chunk, BundleCompression::Lz4).unwrap();
        blocks.push(StorageBlock {
            uncompressed_size: chunk.len() as u32,
            compressed_size: payload.len() as u32,
            flags: 2,
            file_offset: 0,
        });
        payloads.push(payload);
    }
    let info_raw = write_block_info(&[0; 16], &blocks, &entries).unwrap();
    let info = compress(&info_raw, BundleCompression::Lz4).unwrap();

    let mut out = Vec::new();
    out.extend_from_slice(SIGNATURE);
    out.write_u32::<BigEndian>(7).unwrap();
    out.extend_from_slice(b"5.x.x\0");
    out.extend_from_slice(UNITY_VERSION.as_bytes());
    out.push(0);
    let size_at = out.len();
    out.write_i64::<BigEndian>(0).unwrap();
    out.write_u32::<BigEndian>(info.len() as u32).unwrap();
    out.write_u32::<BigEndian>(info_raw.len() as u32).unwrap();
    out.write_u32::<BigEndian>(2).unwrap(); // LZ4 block info, stored after the header
    out.resize(out.len().div_ceil(16) * 16, 0);
    out.extend_from_slice(&info);
    for payload in &payloads {
        out.extend_from_slice(payload);
    }
    let total = out.len() as i64;
    out[size_at..size_at + 8].copy_from_slice(&total.to_be_bytes());
    out
}

/// Write `bytes` to `dir/name` and return the path.
pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// `sharedassets0.assets` with one inline RGBA32, one streamed RGB24
/// texture, and a non-texture object in between; plus its `.resS`.
pub fn write_mixed_assets(dir: &Path) -> PathBuf {
    let mut stream = StreamBuilder::default();
    let streamed = pattern(8 * 8 * 3, 11);
    let offset = stream.push(&pattern(32, 200));
    assert_eq!(offset, 0);
    let offset = stream.push(&streamed);

    let objects = [
        ObjectSpec::Texture(TextureSpec::inline(1, "Logo", 4, 4, FORMAT_RGBA32, pattern(64, 3))),
        ObjectSpec::Other {
            path_id: 2,
            class_id: 1,
            bytes: vec![0xAB; 24],
        },
        ObjectSpec::Texture(TextureSpec::streamed(
            3,
            "Background",
            8,
            8,
            FORMAT_RGB24,
            offset,
            streamed.len() as u32,
            "sharedassets0.assets.resS",
        )),
    ];
    write(dir, "sharedassets0.assets.resS", &stream.bytes);
    write(dir, "sharedassets0.assets", &serialized_file(&objects))
}
