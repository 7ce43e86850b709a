//! Block Compression (BC) compression
//!
//! A range-fit encoder: endpoints come from the darkest and brightest texel
//! of each block, indices from the nearest palette entry.

use super::decode::bc1_colors;

// ============================================================================
// BC1 (DXT1) Encoding
// ============================================================================

/// Encode RGBA pixels to BC1 (DXT1) format
pub fn encode_bc1(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    encode_blocks(pixels, width, height, 8, |block, out| {
        out.copy_from_slice(&encode_bc1_block(block));
    })
}

/// Encode a 4x4 block to BC1 (8 bytes)
fn encode_bc1_block(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let (c0, c1) = find_endpoint_colors(block);

    // c0 > c1 selects 4-color mode (no transparency)
    let (c0_565, c1_565) = if c0 >= c1 { (c0, c1) } else { (c1, c0) };
    let colors = bc1_colors(c0_565, c1_565);

    let mut indices: u32 = 0;
    for (i, pixel) in block.iter().enumerate() {
        let best_idx = find_closest_color(pixel, &colors);
        indices |= u32::from(best_idx) << (i * 2);
    }

    let mut output = [0u8; 8];
    output[0..2].copy_from_slice(&c0_565.to_le_bytes());
    output[2..4].copy_from_slice(&c1_565.to_le_bytes());
    output[4..8].copy_from_slice(&indices.to_le_bytes());
    output
}

// ============================================================================
// BC3 (DXT5) Encoding
// ============================================================================

/// Encode RGBA pixels to BC3 (DXT5) format
pub fn encode_bc3(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    encode_blocks(pixels, width, height, 16, |block, out| {
        out[0..8].copy_from_slice(&encode_bc3_alpha_block(block));
        out[8..16].copy_from_slice(&encode_bc1_block(block));
    })
}

/// Encode alpha channel for BC3 (8 bytes)
fn encode_bc3_alpha_block(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let mut min_alpha = 255u8;
    let mut max_alpha = 0u8;
    for pixel in block {
        min_alpha = min_alpha.min(pixel[3]);
        max_alpha = max_alpha.max(pixel[3]);
    }

    let a0 = max_alpha;
    let a1 = min_alpha;
    let lerp = |w0: u16, w1: u16, div: u16| ((w0 * u16::from(a0) + w1 * u16::from(a1)) / div) as u8;

    // a0 > a1 selects the 8-value ramp; a flat block falls into the 6-value one
    let alphas = if a0 > a1 {
        [
            a0,
            a1,
            lerp(6, 1, 7),
            lerp(5, 2, 7),
            lerp(4, 3, 7),
            lerp(3, 4, 7),
            lerp(2, 5, 7),
            lerp(1, 6, 7),
        ]
    } else {
        [
            a0,
            a1,
            lerp(4, 1, 5),
            lerp(3, 2, 5),
            lerp(2, 3, 5),
            lerp(1, 4, 5),
            0,
            255,
        ]
    };

    let mut indices: u64 = 0;
    for (i, pixel) in block.iter().enumerate() {
        let alpha = i32::from(pixel[3]);
        let mut best_idx = 0u64;
        let mut best_dist = 256i32;
        for (j, &palette_alpha) in alphas.iter().enumerate() {
            let dist = (alpha - i32::from(palette_alpha)).abs();
            if dist < best_dist {
                best_dist = dist;
                best_idx = j as u64;
            }
        }
        indices |= best_idx << (i * 3);
    }

    let mut output = [0u8; 8];
    output[0] = a0;
    output[1] = a1;
    output[2..8].copy_from_slice(&indices.to_le_bytes()[..6]);
    output
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// Run `encode_block` over every 4x4 block in row-major block order
fn encode_blocks(
    pixels: &[u8],
    width: usize,
    height: usize,
    block_size: usize,
    encode_block: impl Fn(&[[u8; 4]; 16], &mut [u8]),
) -> Vec<u8> {
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let mut output = vec![0u8; blocks_x * blocks_y * block_size];

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block = extract_block(pixels, width, height, bx * 4, by * 4);
            let offset = (by * blocks_x + bx) * block_size;
            encode_block(&block, &mut output[offset..offset + block_size]);
        }
    }

    output
}

/// Extract a 4x4 block of RGBA pixels, padding with edge pixels if needed
fn extract_block(pixels: &[u8], width: usize, height: usize, x: usize, y: usize) -> [[u8; 4]; 16] {
    let mut block = [[0u8; 4]; 16];

    for py in 0..4 {
        for px in 0..4 {
            let sx = (x + px).min(width - 1);
            let sy = (y + py).min(height - 1);
            let src = (sy * width + sx) * 4;
            block[py * 4 + px].copy_from_slice(&pixels[src..src + 4]);
        }
    }

    block
}

/// Find endpoint colors for BC1 encoding
fn find_endpoint_colors(block: &[[u8; 4]; 16]) -> (u16, u16) {
    let mut min_lum = 255 * 3;
    let mut max_lum = 0;
    let mut min_pixel = [0u8; 3];
    let mut max_pixel = [0u8; 3];

    for pixel in block {
        let lum = u32::from(pixel[0]) + u32::from(pixel[1]) + u32::from(pixel[2]);
        if lum < min_lum {
            min_lum = lum;
            min_pixel = [pixel[0], pixel[1], pixel[2]];
        }
        if lum > max_lum {
            max_lum = lum;
            max_pixel = [pixel[0], pixel[1], pixel[2]];
        }
    }

    let c0 = rgb_to_565(max_pixel[0], max_pixel[1], max_pixel[2]);
    let c1 = rgb_to_565(min_pixel[0], min_pixel[1], min_pixel[2]);
    (c0, c1)
}

/// Convert RGB888 to RGB565
pub fn rgb_to_565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = u16::from(r >> 3);
    let g6 = u16::from(g >> 2);
    let b5 = u16::from(b >> 3);
    (r5 << 11) | (g6 << 5) | b5
}

/// Find the closest color in the palette
fn find_closest_color(pixel: &[u8; 4], palette: &[[u8; 4]; 4]) -> u8 {
    let mut best_idx = 0u8;
    let mut best_dist = u32::MAX;

    for (i, color) in palette.iter().enumerate() {
        let dr = i32::from(pixel[0]) - i32::from(color[0]);
        let dg = i32::from(pixel[1]) - i32::from(color[1]);
        let db = i32::from(pixel[2]) - i32::from(color[2]);
        let dist = (dr * dr + dg * dg + db * db) as u32;

        if dist < best_dist {
            best_dist = dist;
            best_idx = i as u8;
        }
    }

    best_idx
}

#[cfg(test)]
mod tests {
    use super::super::decode::{BcFormat, decode_bc};
    use super::*;

    #[test]
    fn test_rgb_to_565() {
        assert_eq!(rgb_to_565(255, 255, 255), 0xFFFF);
        assert_eq!(rgb_to_565(0, 0, 0), 0x0000);
        assert_eq!(rgb_to_565(255, 0, 0), 0xF800); // Red
        assert_eq!(rgb_to_565(0, 255, 0), 0x07E0); // Green
        assert_eq!(rgb_to_565(0, 0, 255), 0x001F); // Blue
    }

    #[test]
    fn test_two_tone_block_survives_bc1() {
        // left half white, right half black
        let mut pixels = Vec::new();
        for _ in 0..4 {
            for x in 0..4 {
                let v = if x < 2 { 255 } else { 0 };
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let encoded = encode_bc1(&pixels, 4, 4);
        assert_eq!(encoded.len(), 8);
        assert_eq!(decode_bc(&encoded, 4, 4, BcFormat::Bc1), pixels);
    }

    #[test]
    fn test_bc3_keeps_alpha_extremes() {
        let mut pixels = Vec::new();
        for i in 0..16 {
            let a = if i % 2 == 0 { 0 } else { 255 };
            pixels.extend_from_slice(&[40, 80, 120, a]);
        }
        let encoded = encode_bc3(&pixels, 4, 4);
        assert_eq!(encoded.len(), 16);
        let decoded = decode_bc(&encoded, 4, 4, BcFormat::Bc3);
        for (i, px) in decoded.chunks_exact(4).enumerate() {
            assert_eq!(px[3], if i % 2 == 0 { 0 } else { 255 });
        }
    }

    #[test]
    fn test_partial_blocks_pad_from_edges() {
        let pixels = vec![200u8; 2 * 3 * 4];
        assert_eq!(encode_bc3(&pixels, 2, 3).len(), 16);
        assert_eq!(encode_bc1(&vec![0u8; 5 * 5 * 4], 5, 5).len(), 4 * 8);
    }
}
