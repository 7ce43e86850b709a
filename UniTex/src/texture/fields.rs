//! Texture2D object decoding
//!
//! Uses the file's type tree when present. Game builds usually strip type
//! trees, so a version-keyed layout covers that case.

use crate::error::{Error, Result};
use crate::formats::common::UnityVersion;
use crate::formats::serialized::{ObjectInfo, SerializedFile, Value, read_object};
use crate::utils::BinaryReader;

use super::format::{TextureFormat, full_mip_count};

/// Unity class id of Texture2D.
pub const CLASS_TEXTURE2D: i32 = 28;

/// `m_StreamData`: where pixel data lives outside the object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamData {
    pub offset: u64,
    pub size: u64,
    pub path: String,
}

impl StreamData {
    pub fn is_used(&self) -> bool {
        self.size > 0 && !self.path.is_empty()
    }
}

/// Fields of a Texture2D needed to locate and interpret its pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture2DFields {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mip_count: u32,
    pub image_count: u32,
    pub complete_image_size: u64,
    pub is_readable: bool,
    /// Inline `image data` as `(offset, len)` in the file buffer.
    pub image_data: (usize, usize),
    pub stream: Option<StreamData>,
}

/// Decode the Texture2D at `object` from the serialized-file buffer `data`.
pub fn read_texture2d(
    file: &SerializedFile,
    object: &ObjectInfo,
    data: &[u8],
) -> Result<Texture2DFields> {
    let object_bytes = object
        .byte_start
        .checked_add(object.byte_size)
        .and_then(|end| data.get(..end))
        .ok_or_else(|| Error::Corrupt {
            offset: object.byte_start,
            message: "object extends past buffer".to_string(),
        })?;
    let mut reader = BinaryReader::at(object_bytes, object.byte_start, file.big_endian());

    match file.type_tree(object) {
        Some(tree) => from_value(&read_object(tree, &mut reader)?, &file.unity_version),
        None => read_fallback(&mut reader, &file.unity_version),
    }
}

fn from_value(value: &Value, version: &UnityVersion) -> Result<Texture2DFields> {
    let int = |field: &str| value.get(field).and_then(Value::as_i64);
    let missing = |field: &str| Error::Corrupt {
        offset: 0,
        message: format!("Texture2D has no {field}"),
    };
    let dimension = |field: &'static str| -> Result<u32> {
        let raw = int(field).ok_or_else(|| missing(field))?;
        u32::try_from(raw).map_err(|_| Error::Corrupt {
            offset: 0,
            message: format!("{field} is {raw}"),
        })
    };

    let width = dimension("m_Width")?;
    let height = dimension("m_Height")?;
    let format = TextureFormat::from_id(
        int("m_TextureFormat").ok_or_else(|| missing("m_TextureFormat"))? as i32,
    );
    let mip_count = match int("m_MipCount") {
        Some(count) => count.max(1) as u32,
        None if value.get("m_MipMap").and_then(Value::as_bool) == Some(true) => {
            full_mip_count(width, height)
        }
        None => 1,
    };

    let stream = value.get("m_StreamData").map(|s| StreamData {
        offset: s.get("offset").and_then(Value::as_u64).unwrap_or(0),
        size: s.get("size").and_then(Value::as_u64).unwrap_or(0),
        path: s
            .get("path")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    });

    let image_data = value
        .get("image data")
        .and_then(Value::as_bytes_range)
        .unwrap_or((0, 0));

    tracing::trace!("Texture2D via type tree (Unity {version})");
    Ok(Texture2DFields {
        name: value
            .get("m_Name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        width,
        height,
        format,
        mip_count,
        image_count: int("m_ImageCount").map_or(1, |n| n.max(1) as u32),
        complete_image_size: int("m_CompleteImageSize").map_or(0, |n| n.max(0) as u64),
        is_readable: value
            .get("m_IsReadable")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        image_data,
        stream,
    })
}

/// Field layout by engine version, for files without type trees.
fn read_fallback(reader: &mut BinaryReader<'_>, version: &UnityVersion) -> Result<Texture2DFields> {
    let name = reader.read_aligned_string()?;
    if version.at_least(2017, 3) {
        let _forced_fallback_format = reader.read_i32()?;
        let _downscale_fallback = reader.read_bool()?;
        if version.at_least(2020, 2) {
            let _is_alpha_channel_optional = reader.read_bool()?;
        }
        reader.align(4)?;
    }

    let width = read_dimension(reader, "m_Width")?;
    let height = read_dimension(reader, "m_Height")?;
    let complete_image_size = u64::from(reader.read_u32()?);
    if version.at_least(2020, 1) {
        let _mips_stripped = reader.read_i32()?;
    }
    let format = TextureFormat::from_id(reader.read_i32()?);

    let mip_count = if version.at_least(5, 2) {
        reader.read_i32()?.max(1) as u32
    } else if reader.read_bool()? {
        full_mip_count(width, height)
    } else {
        1
    };

    let mut is_readable = false;
    if version.at_least(2, 6) {
        is_readable = reader.read_bool()?;
    }
    if version.at_least(2020, 1) {
        let _is_pre_processed = reader.read_bool()?;
    }
    if version.at_least(2019, 3) {
        let _ignore_master_texture_limit = reader.read_bool()?;
    }
    if version.at_least(3, 0) && !version.at_least(5, 5) {
        let _read_allowed = reader.read_bool()?;
    }
    if version.at_least(2022, 2) {
        reader.align(4)?;
        let _mipmap_limit_group_name = reader.read_aligned_string()?;
    }
    if version.at_least(2018, 2) {
        let _streaming_mipmaps = reader.read_bool()?;
    }
    reader.align(4)?;
    if version.at_least(2018, 2) {
        let _streaming_mipmaps_priority = reader.read_i32()?;
    }

    let image_count = reader.read_i32()?.max(1) as u32;
    let _texture_dimension = reader.read_i32()?;

    // m_TextureSettings
    let _filter_mode = reader.read_i32()?;
    let _aniso = reader.read_i32()?;
    let _mip_bias = reader.read_f32()?;
    if version.at_least(2017, 1) {
        reader.skip(12)?;
    } else {
        let _wrap_mode = reader.read_i32()?;
    }

    if version.at_least(3, 0) {
        let _lightmap_format = reader.read_i32()?;
    }
    if version.at_least(3, 5) {
        let _color_space = reader.read_i32()?;
    }
    if version.at_least(2020, 2) {
        let blob_len = reader.read_len()?;
        reader.skip(blob_len)?;
        reader.align(4)?;
    }

    let data_len = reader.read_len()?;
    let data_offset = reader.position();
    reader.skip(data_len)?;

    let mut stream = None;
    if version.at_least(5, 3) && reader.remaining() >= 4 {
        reader.align(4)?;
        let offset = if version.at_least(2020, 1) {
            reader.read_u64()?
        } else {
            u64::from(reader.read_u32()?)
        };
        let size = u64::from(reader.read_u32()?);
        let path = reader.read_aligned_string()?;
        stream = Some(StreamData { offset, size, path });
    }

    Ok(Texture2DFields {
        name,
        width,
        height,
        format,
        mip_count,
        image_count,
        complete_image_size,
        is_readable,
        image_data: (data_offset, data_len),
        stream,
    })
}

fn read_dimension(reader: &mut BinaryReader<'_>, field: &str) -> Result<u32> {
    let offset = reader.position();
    let raw = reader.read_i32()?;
    u32::try_from(raw).map_err(|_| Error::Corrupt {
        offset,
        message: format!("{field} is {raw}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, WriteBytesExt};

    fn aligned_string(out: &mut Vec<u8>, text: &str) {
        out.write_i32::<LittleEndian>(text.len() as i32).unwrap();
        out.extend_from_slice(text.as_bytes());
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }

    /// Texture2D object bytes as a 2019.4 player writes them.
    fn texture_2019(pixels: &[u8], stream: Option<(u32, u32, &str)>) -> Vec<u8> {
        let mut out = Vec::new();
        aligned_string(&mut out, "Logo");
        out.write_i32::<LittleEndian>(1).unwrap(); // forced fallback
        out.extend_from_slice(&[0, 0, 0, 0]); // downscale fallback + align
        out.write_i32::<LittleEndian>(2).unwrap();
        out.write_i32::<LittleEndian>(2).unwrap();
        out.write_i32::<LittleEndian>(16).unwrap();
        out.write_i32::<LittleEndian>(4).unwrap(); // RGBA32
        out.write_i32::<LittleEndian>(1).unwrap(); // mip count
        out.extend_from_slice(&[1, 0, 0, 0]); // readable, ignore limit, streaming + align
        out.write_i32::<LittleEndian>(0).unwrap(); // streaming priority
        out.write_i32::<LittleEndian>(1).unwrap(); // image count
        out.write_i32::<LittleEndian>(2).unwrap(); // dimension
        out.write_i32::<LittleEndian>(1).unwrap(); // filter
        out.write_i32::<LittleEndian>(1).unwrap(); // aniso
        out.write_f32::<LittleEndian>(0.0).unwrap();
        out.extend_from_slice(&[0; 12]); // wrap u/v/w
        out.write_i32::<LittleEndian>(0).unwrap(); // lightmap
        out.write_i32::<LittleEndian>(1).unwrap(); // color space
        out.write_i32::<LittleEndian>(pixels.len() as i32).unwrap();
        out.extend_from_slice(pixels);
        while out.len() % 4 != 0 {
            out.push(0);
        }
        let (offset, size, path) = stream.unwrap_or((0, 0, ""));
        out.write_u32::<LittleEndian>(offset).unwrap();
        out.write_u32::<LittleEndian>(size).unwrap();
        aligned_string(&mut out, path);
        out
    }

    #[test]
    fn test_fallback_inline_pixels() {
        let pixels = [7u8; 16];
        let data = texture_2019(&pixels, None);
        let mut reader = BinaryReader::new(&data, false);
        let fields = read_fallback(&mut reader, &UnityVersion::parse("2019.4.31f1")).unwrap();

        assert_eq!(fields.name, "Logo");
        assert_eq!((fields.width, fields.height), (2, 2));
        assert_eq!(fields.format, TextureFormat::Rgba32);
        assert_eq!(fields.mip_count, 1);
        assert!(fields.is_readable);
        assert_eq!(&data[fields.image_data.0..fields.image_data.0 + 16], &pixels);
        assert!(!fields.stream.unwrap().is_used());
    }

    #[test]
    fn test_fallback_streamed_pixels() {
        let data = texture_2019(&[], Some((4096, 16, "sharedassets0.assets.resS")));
        let mut reader = BinaryReader::new(&data, false);
        let fields = read_fallback(&mut reader, &UnityVersion::parse("2019.4.31f1")).unwrap();

        assert_eq!(fields.image_data.1, 0);
        let stream = fields.stream.unwrap();
        assert!(stream.is_used());
        assert_eq!(stream.offset, 4096);
        assert_eq!(stream.path, "sharedassets0.assets.resS");
    }
}
