//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Block Compression (BC) decompression using bcdec_rs

/// Block-compressed layouts with a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BcFormat {
    Bc1, // DXT1 - 8 bytes per 4x4 block
    Bc3, // DXT5 - 16 bytes per 4x4 block (interpolated alpha)
    Bc4, // Single channel - 8 bytes per 4x4 block
    Bc5, // Two channels - 16 bytes per 4x4 block
    Bc7, // High quality - 16 bytes per 4x4 block
}

impl BcFormat {
    /// Block size in bytes for this format
    pub const fn block_size(self) -> usize {
        match self {
            Self::Bc1 | Self::Bc4 => 8,
            Self::Bc3 | Self::Bc5 | Self::Bc7 => 16,
        }
    }

    /// Bytes per pixel bcdec_rs writes for one decoded block
    const fn decoded_channels(self) -> usize {
        match self {
            Self::Bc4 => 1,
            Self::Bc5 => 2,
            Self::Bc1 | Self::Bc3 | Self::Bc7 => 4,
        }
    }
}

/// Decode BC-compressed data to RGBA8.
///
/// Blocks missing at the end of `data` leave their pixels transparent black.
pub fn decode_bc(data: &[u8], width: usize, height: usize, format: BcFormat) -> Vec<u8> {
    let mut rgba = vec![0u8; width * height * 4];
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let block_size = format.block_size();
    let channels = format.decoded_channels();

    // One decoded 4x4 block, 4 pixels per row
    let mut decoded = [0u8; 64];
    let pitch = 4 * channels;

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let start = (by * blocks_x + bx) * block_size;
            let Some(block) = data.get(start..start + block_size) else {
                return rgba;
            };

            match format {
                BcFormat::Bc1 => bcdec_rs::bc1(block, &mut decoded, pitch),
                BcFormat::Bc3 => bcdec_rs::bc3(block, &mut decoded, pitch),
                BcFormat::Bc4 => bcdec_rs::bc4(block, &mut decoded, pitch, false),
                BcFormat::Bc5 => bcdec_rs::bc5(block, &mut decoded, pitch, false),
                BcFormat::Bc7 => bcdec_rs::bc7(block, &mut decoded, pitch),
            }

            for py in 0..4 {
                for px in 0..4 {
                    let fx = bx * 4 + px;
                    let fy = by * 4 + py;
                    if fx >= width || fy >= height {
                        continue;
                    }
                    let src = py * pitch + px * channels;
                    let dst = (fy * width + fx) * 4;
                    rgba[dst..dst + 4].copy_from_slice(&expand(&decoded[src..src + channels]));
                }
            }
        }
    }

    rgba
}

/// Widen a decoded BC4/BC5 texel to RGBA; BC1/3/7 texels pass through.
fn expand(texel: &[u8]) -> [u8; 4] {
    match *texel {
        [r] => [r, 0, 0, 255],
        [r, g] => [r, g, 0, 255],
        [r, g, b, a] => [r, g, b, a],
        _ => [0, 0, 0, 255],
    }
}

/// Expand a 565 color to RGB888 with bit replication
pub fn rgb565_to_888(c: u16) -> [u8; 3] {
    let r = ((c >> 11) & 0x1F) as u8;
    let g = ((c >> 5) & 0x3F) as u8;
    let b = (c & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

/// BC1 palette for two 565 endpoints.
///
/// Four-color mode when `c0 > c1`, otherwise three colors plus transparent black.
pub fn bc1_colors(c0: u16, c1: u16) -> [[u8; 4]; 4] {
    let a = rgb565_to_888(c0).map(u16::from);
    let b = rgb565_to_888(c1).map(u16::from);
    let mix = |wa: u16, wb: u16, div: u16| -> [u8; 4] {
        [
            ((wa * a[0] + wb * b[0]) / div) as u8,
            ((wa * a[1] + wb * b[1]) / div) as u8,
            ((wa * a[2] + wb * b[2]) / div) as u8,
            255,
        ]
    };

    let color0 = mix(1, 0, 1);
    let color1 = mix(0, 1, 1);
    if c0 > c1 {
        [color0, color1, mix(2, 1, 3), mix(1, 2, 3)]
    } else {
        [color0, color1, mix(1, 1, 2), [0, 0, 0, 0]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bc1_palette() {
        let colors = bc1_colors(0xFFFF, 0x0000);
        assert_eq!(colors[0], [255, 255, 255, 255]);
        assert_eq!(colors[1], [0, 0, 0, 255]);
        assert_eq!(colors[2], [170, 170, 170, 255]);
        assert_eq!(colors[3], [85, 85, 85, 255]);

        let three = bc1_colors(0x0000, 0xFFFF);
        assert_eq!(three[2], [127, 127, 127, 255]);
        assert_eq!(three[3], [0, 0, 0, 0]);
    }

    #[test]
    fn test_decode_solid_bc1_block() {
        // c0 = c1 = pure red, all indices 0
        let block = [0x00, 0xF8, 0x00, 0xF8, 0, 0, 0, 0];
        let rgba = decode_bc(&block, 4, 4, BcFormat::Bc1);
        for px in rgba.chunks_exact(4) {
            assert_eq!(px, [255, 0, 0, 255]);
        }
    }

    #[test]
    fn test_decode_bc4_widens_to_red() {
        // endpoints 200/200, all indices 0
        let block = [200, 200, 0, 0, 0, 0, 0, 0];
        let rgba = decode_bc(&block, 2, 2, BcFormat::Bc4);
        assert_eq!(rgba.len(), 16);
        for px in rgba.chunks_exact(4) {
            assert_eq!(px, [200, 0, 0, 255]);
        }
    }
}
