//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Texture codec adapter
//!
//! Converts a record's stored pixel data to a [`RasterImage`] and back.
//! Uncompressed layouts are handled in [`pixel`]; block-compressed layouts
//! are dispatched through a [`CodecRegistry`] of [`BlockCodec`]s keyed by
//! [`TextureFormat`].
//!
//! Unity stores rows bottom-up. Decoded images are top-down; encoding flips
//! them back and rebuilds the full mip chain the record declares.

#![allow(clippy::cast_possible_truncation)]

pub mod bcn;
pub mod pixel;
mod raster;

use std::collections::HashMap;
use std::fmt;

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::container::Container;
use crate::error::{Error, Result};
use crate::texture::{TextureFormat, TextureRecord, mip_dimensions};

pub use raster::{ChannelLayout, RasterImage};

use bcn::{BcCodec, BcFormat};

/// A decoder (and optionally encoder) for one block-compressed layout.
///
/// Implementations convert between stored blocks and RGBA8 pixels of a
/// single mip level; row order and mip chains are handled by the caller.
pub trait BlockCodec: Send + Sync {
    /// Decode one level to `width * height * 4` RGBA bytes.
    fn decode(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>>;

    /// Whether [`BlockCodec::encode`] is implemented.
    fn can_encode(&self) -> bool {
        false
    }

    /// Encode one level of RGBA pixels; `None` for decode-only codecs.
    fn encode(&self, _rgba: &[u8], _width: u32, _height: u32) -> Option<Vec<u8>> {
        None
    }
}

/// Block codecs by texture format.
pub struct CodecRegistry {
    codecs: HashMap<TextureFormat, Box<dyn BlockCodec>>,
}

impl CodecRegistry {
    /// A registry with no block codecs; only uncompressed layouts work.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Register `codec` for `format`, replacing any previous one.
    pub fn register(&mut self, format: TextureFormat, codec: impl BlockCodec + 'static) {
        self.codecs.insert(format, Box::new(codec));
    }

    #[must_use]
    pub fn with_codec(mut self, format: TextureFormat, codec: impl BlockCodec + 'static) -> Self {
        self.register(format, codec);
        self
    }

    pub fn get(&self, format: TextureFormat) -> Option<&dyn BlockCodec> {
        self.codecs.get(&format).map(Box::as_ref)
    }

    pub fn can_decode(&self, format: TextureFormat) -> bool {
        pixel::supports(format) || self.codecs.contains_key(&format)
    }

    pub fn can_encode(&self, format: TextureFormat) -> bool {
        pixel::supports(format) || self.get(format).is_some_and(BlockCodec::can_encode)
    }
}

impl Default for CodecRegistry {
    /// DXT1/DXT5 decode and encode; BC4, BC5 and BC7 decode only.
    fn default() -> Self {
        Self::empty()
            .with_codec(TextureFormat::Dxt1, BcCodec::new(BcFormat::Bc1))
            .with_codec(TextureFormat::Dxt5, BcCodec::new(BcFormat::Bc3))
            .with_codec(TextureFormat::Bc4, BcCodec::new(BcFormat::Bc4))
            .with_codec(TextureFormat::Bc5, BcCodec::new(BcFormat::Bc5))
            .with_codec(TextureFormat::Bc7, BcCodec::new(BcFormat::Bc7))
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<String> = self.codecs.keys().map(|f| f.name()).collect();
        formats.sort();
        f.debug_struct("CodecRegistry").field("formats", &formats).finish()
    }
}

fn unsupported(record: &TextureRecord, operation: &'static str) -> Error {
    Error::UnsupportedFormat {
        texture: record.display_name(),
        format: record.format,
        operation,
    }
}

/// Decode the top mip level of `record` from its container.
///
/// # Errors
/// Returns [`Error::UnsupportedFormat`] if no decoder exists for the
/// record's format, or [`Error::TruncatedPixelData`] if the stored data is
/// shorter than one level.
pub fn decode(
    container: &Container,
    record: &TextureRecord,
    registry: &CodecRegistry,
) -> Result<RasterImage> {
    if !registry.can_decode(record.format) {
        return Err(unsupported(record, "decode"));
    }
    let bytes = container.texture_bytes(record)?;
    decode_bytes(record, &bytes, registry)
}

/// Decode the top mip level of `record` from already-read pixel data.
pub fn decode_bytes(
    record: &TextureRecord,
    data: &[u8],
    registry: &CodecRegistry,
) -> Result<RasterImage> {
    let expected = record
        .level0_size()
        .ok_or_else(|| unsupported(record, "decode"))?;
    if data.len() < expected {
        return Err(Error::TruncatedPixelData {
            texture: record.display_name(),
            expected,
            actual: data.len(),
        });
    }

    let (width, height) = (record.width, record.height);
    let level = &data[..expected];
    let rgba = if pixel::supports(record.format) {
        pixel::decode(record.format, level, width, height)
            .ok_or_else(|| unsupported(record, "decode"))?
    } else if let Some(codec) = registry.get(record.format) {
        codec.decode(level, width, height)?
    } else {
        return Err(unsupported(record, "decode"));
    };

    let layout = ChannelLayout::for_alpha(record.wants_alpha());
    let mut image = RasterImage::from_rgba(width, height, rgba, layout);
    image.flip_vertical();
    Ok(image)
}

/// Encode `image` into the stored representation of `record`.
///
/// The image must already match the record's dimensions and alpha
/// expectation (see [`crate::conform::conform`]). The result holds every
/// mip level of every image slice, so its length matches a well-formed
/// record's byte range.
///
/// Lower mip levels are regenerated from the image, so decoding and
/// re-encoding is byte-identical only for single-level uncompressed
/// textures. [`encode_over`] keeps the stored chain when the top level is
/// unchanged.
///
/// # Errors
/// Returns [`Error::UnsupportedFormat`] if the format has no encoder, or
/// [`Error::Encode`] if the image does not match the record.
pub fn encode(image: &RasterImage, record: &TextureRecord, registry: &CodecRegistry) -> Result<Vec<u8>> {
    if !registry.can_encode(record.format) {
        return Err(unsupported(record, "encode"));
    }
    let encode_error = |message: String| Error::Encode {
        texture: record.display_name(),
        message,
    };
    if image.has_alpha() != record.wants_alpha() {
        return Err(encode_error(format!(
            "{:?} image cannot be stored as {} (strip or add alpha first)",
            image.layout, record.format
        )));
    }
    if (image.width, image.height) != (record.width, record.height) {
        return Err(encode_error(format!(
            "image is {}x{}, texture is {}x{}",
            image.width, image.height, record.width, record.height
        )));
    }

    let mut stored = image.clone();
    stored.flip_vertical();
    let top = RgbaImage::from_raw(stored.width, stored.height, stored.to_rgba())
        .ok_or_else(|| encode_error("pixel buffer does not match dimensions".to_string()))?;

    let mut chain = Vec::new();
    for (level, (width, height)) in mip_dimensions(record.width, record.height, record.mip_count).enumerate() {
        let encoded = if level == 0 {
            encode_level(record.format, registry, top.as_raw(), width, height)
        } else {
            let scaled = imageops::resize(&top, width, height, FilterType::Triangle);
            encode_level(record.format, registry, scaled.as_raw(), width, height)
        };
        chain.extend(encoded.ok_or_else(|| unsupported(record, "encode"))?);
    }

    let slices = record.image_count.max(1) as usize;
    let mut payload = Vec::with_capacity(chain.len() * slices);
    for _ in 0..slices {
        payload.extend_from_slice(&chain);
    }
    tracing::debug!(
        "Encoded '{}' as {} ({} levels, {} bytes)",
        record.display_name(),
        record.format,
        record.mip_count,
        payload.len()
    );
    Ok(payload)
}

/// Encode `image` for `record`, keeping `stored` as is when the encoded top
/// level equals the stored one.
///
/// With an unchanged image this returns the stored bytes, lower mip levels
/// and slices included, so a decode followed by `encode_over` never alters
/// a texture.
///
/// # Errors
/// See [`encode`].
pub fn encode_over(
    image: &RasterImage,
    record: &TextureRecord,
    stored: &[u8],
    registry: &CodecRegistry,
) -> Result<Vec<u8>> {
    let payload = encode(image, record, registry)?;
    let unchanged = record.level0_size().is_some_and(|top| {
        stored.len() == payload.len() && top <= payload.len() && stored[..top] == payload[..top]
    });
    if unchanged {
        tracing::debug!("'{}' top level unchanged; keeping stored mip chain", record.display_name());
        return Ok(stored.to_vec());
    }
    Ok(payload)
}

fn encode_level(
    format: TextureFormat,
    registry: &CodecRegistry,
    rgba: &[u8],
    width: u32,
    height: u32,
) -> Option<Vec<u8>> {
    if pixel::supports(format) {
        pixel::encode(format, rgba)
    } else {
        registry.get(format)?.encode(rgba, width, height)
    }
}
