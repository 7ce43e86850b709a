//! Uncompressed pixel layouts
//!
//! All layouts convert to and from RGBA8. 16-bit packed layouts are stored
//! little-endian, as every desktop and mobile player writes them.

use byteorder::{ByteOrder, LittleEndian};

use crate::texture::TextureFormat;

/// Whether `format` is an uncompressed layout handled here.
pub fn supports(format: TextureFormat) -> bool {
    matches!(
        format,
        TextureFormat::Alpha8
            | TextureFormat::Argb4444
            | TextureFormat::Rgb24
            | TextureFormat::Rgba32
            | TextureFormat::Argb32
            | TextureFormat::Rgb565
            | TextureFormat::Rgba4444
            | TextureFormat::Bgra32
            | TextureFormat::Rg16
            | TextureFormat::R8
    )
}

/// Decode one level of `width * height` pixels to RGBA8.
///
/// Returns `None` for layouts not handled here. `data` must hold at least
/// one full level.
pub fn decode(format: TextureFormat, data: &[u8], width: u32, height: u32) -> Option<Vec<u8>> {
    let bpp = format.bytes_per_pixel()?;
    if !supports(format) {
        return None;
    }
    let count = width as usize * height as usize;
    let mut rgba = Vec::with_capacity(count * 4);
    for px in data[..count * bpp].chunks_exact(bpp) {
        rgba.extend_from_slice(&decode_pixel(format, px));
    }
    Some(rgba)
}

/// Encode RGBA8 pixels to one level of `format`.
pub fn encode(format: TextureFormat, rgba: &[u8]) -> Option<Vec<u8>> {
    let bpp = format.bytes_per_pixel()?;
    if !supports(format) {
        return None;
    }
    let mut out = Vec::with_capacity(rgba.len() / 4 * bpp);
    for px in rgba.chunks_exact(4) {
        encode_pixel(format, [px[0], px[1], px[2], px[3]], &mut out);
    }
    Some(out)
}

fn decode_pixel(format: TextureFormat, px: &[u8]) -> [u8; 4] {
    match format {
        TextureFormat::Alpha8 => [255, 255, 255, px[0]],
        TextureFormat::R8 => [px[0], 0, 0, 255],
        TextureFormat::Rg16 => [px[0], px[1], 0, 255],
        TextureFormat::Rgb24 => [px[0], px[1], px[2], 255],
        TextureFormat::Rgba32 => [px[0], px[1], px[2], px[3]],
        TextureFormat::Argb32 => [px[1], px[2], px[3], px[0]],
        TextureFormat::Bgra32 => [px[2], px[1], px[0], px[3]],
        TextureFormat::Argb4444 => {
            let v = LittleEndian::read_u16(px);
            [nibble(v, 8), nibble(v, 4), nibble(v, 0), nibble(v, 12)]
        }
        TextureFormat::Rgba4444 => {
            let v = LittleEndian::read_u16(px);
            [nibble(v, 12), nibble(v, 8), nibble(v, 4), nibble(v, 0)]
        }
        TextureFormat::Rgb565 => {
            let v = LittleEndian::read_u16(px);
            let r = ((v >> 11) & 0x1F) as u8;
            let g = ((v >> 5) & 0x3F) as u8;
            let b = (v & 0x1F) as u8;
            [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2), 255]
        }
        _ => [0, 0, 0, 255],
    }
}

fn encode_pixel(format: TextureFormat, [r, g, b, a]: [u8; 4], out: &mut Vec<u8>) {
    match format {
        TextureFormat::Alpha8 => out.push(a),
        TextureFormat::R8 => out.push(r),
        TextureFormat::Rg16 => out.extend_from_slice(&[r, g]),
        TextureFormat::Rgb24 => out.extend_from_slice(&[r, g, b]),
        TextureFormat::Rgba32 => out.extend_from_slice(&[r, g, b, a]),
        TextureFormat::Argb32 => out.extend_from_slice(&[a, r, g, b]),
        TextureFormat::Bgra32 => out.extend_from_slice(&[b, g, r, a]),
        TextureFormat::Argb4444 => {
            push_u16(out, (pack4(a) << 12) | (pack4(r) << 8) | (pack4(g) << 4) | pack4(b));
        }
        TextureFormat::Rgba4444 => {
            push_u16(out, (pack4(r) << 12) | (pack4(g) << 8) | (pack4(b) << 4) | pack4(a));
        }
        TextureFormat::Rgb565 => {
            let v = (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3);
            push_u16(out, v);
        }
        _ => {}
    }
}

/// Expand the 4-bit field at `shift` to 8 bits.
fn nibble(v: u16, shift: u32) -> u8 {
    ((v >> shift) & 0xF) as u8 * 17
}

fn pack4(v: u8) -> u16 {
    u16::from(v >> 4)
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    let mut buf = [0u8; 2];
    LittleEndian::write_u16(&mut buf, v);
    out.extend_from_slice(&buf);
}
