//! Unity `TextureFormat` tags and their storage layouts

use std::fmt;

/// Pixel format declared by a Texture2D (`m_TextureFormat`).
///
/// Unknown tags are preserved so records with newer formats still list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Alpha8,
    Argb4444,
    Rgb24,
    Rgba32,
    Argb32,
    Rgb565,
    R16,
    Dxt1,
    Dxt5,
    Rgba4444,
    Bgra32,
    RHalf,
    RgHalf,
    RgbaHalf,
    RFloat,
    RgFloat,
    RgbaFloat,
    Yuy2,
    Rgb9e5Float,
    Bc6h,
    Bc7,
    Bc4,
    Bc5,
    Dxt1Crunched,
    Dxt5Crunched,
    PvrtcRgb2,
    PvrtcRgba2,
    PvrtcRgb4,
    PvrtcRgba4,
    EtcRgb4,
    EacR,
    EacRSigned,
    EacRg,
    EacRgSigned,
    Etc2Rgb,
    Etc2Rgba1,
    Etc2Rgba8,
    /// ASTC with the given square block edge (4, 5, 6, 8, 10, 12).
    AstcRgb(u8),
    AstcRgba(u8),
    Rg16,
    R8,
    EtcRgb4Crunched,
    Etc2Rgba8Crunched,
    Unknown(i32),
}

impl TextureFormat {
    pub fn from_id(id: i32) -> Self {
        match id {
            1 => Self::Alpha8,
            2 => Self::Argb4444,
            3 => Self::Rgb24,
            4 => Self::Rgba32,
            5 => Self::Argb32,
            7 => Self::Rgb565,
            9 => Self::R16,
            10 => Self::Dxt1,
            12 => Self::Dxt5,
            13 => Self::Rgba4444,
            14 => Self::Bgra32,
            15 => Self::RHalf,
            16 => Self::RgHalf,
            17 => Self::RgbaHalf,
            18 => Self::RFloat,
            19 => Self::RgFloat,
            20 => Self::RgbaFloat,
            21 => Self::Yuy2,
            22 => Self::Rgb9e5Float,
            24 => Self::Bc6h,
            25 => Self::Bc7,
            26 => Self::Bc4,
            27 => Self::Bc5,
            28 => Self::Dxt1Crunched,
            29 => Self::Dxt5Crunched,
            30 => Self::PvrtcRgb2,
            31 => Self::PvrtcRgba2,
            32 => Self::PvrtcRgb4,
            33 => Self::PvrtcRgba4,
            34 => Self::EtcRgb4,
            41 => Self::EacR,
            42 => Self::EacRSigned,
            43 => Self::EacRg,
            44 => Self::EacRgSigned,
            45 => Self::Etc2Rgb,
            46 => Self::Etc2Rgba1,
            47 => Self::Etc2Rgba8,
            48..=53 => Self::AstcRgb(ASTC_BLOCKS[(id - 48) as usize]),
            54..=59 => Self::AstcRgba(ASTC_BLOCKS[(id - 54) as usize]),
            62 => Self::Rg16,
            63 => Self::R8,
            64 => Self::EtcRgb4Crunched,
            65 => Self::Etc2Rgba8Crunched,
            other => Self::Unknown(other),
        }
    }

    pub fn id(self) -> i32 {
        match self {
            Self::Alpha8 => 1,
            Self::Argb4444 => 2,
            Self::Rgb24 => 3,
            Self::Rgba32 => 4,
            Self::Argb32 => 5,
            Self::Rgb565 => 7,
            Self::R16 => 9,
            Self::Dxt1 => 10,
            Self::Dxt5 => 12,
            Self::Rgba4444 => 13,
            Self::Bgra32 => 14,
            Self::RHalf => 15,
            Self::RgHalf => 16,
            Self::RgbaHalf => 17,
            Self::RFloat => 18,
            Self::RgFloat => 19,
            Self::RgbaFloat => 20,
            Self::Yuy2 => 21,
            Self::Rgb9e5Float => 22,
            Self::Bc6h => 24,
            Self::Bc7 => 25,
            Self::Bc4 => 26,
            Self::Bc5 => 27,
            Self::Dxt1Crunched => 28,
            Self::Dxt5Crunched => 29,
            Self::PvrtcRgb2 => 30,
            Self::PvrtcRgba2 => 31,
            Self::PvrtcRgb4 => 32,
            Self::PvrtcRgba4 => 33,
            Self::EtcRgb4 => 34,
            Self::EacR => 41,
            Self::EacRSigned => 42,
            Self::EacRg => 43,
            Self::EacRgSigned => 44,
            Self::Etc2Rgb => 45,
            Self::Etc2Rgba1 => 46,
            Self::Etc2Rgba8 => 47,
            Self::AstcRgb(block) => 48 + astc_index(block),
            Self::AstcRgba(block) => 54 + astc_index(block),
            Self::Rg16 => 62,
            Self::R8 => 63,
            Self::EtcRgb4Crunched => 64,
            Self::Etc2Rgba8Crunched => 65,
            Self::Unknown(id) => id,
        }
    }

    /// Bytes per pixel for uncompressed layouts.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Alpha8 | Self::R8 => Some(1),
            Self::Argb4444
            | Self::Rgb565
            | Self::R16
            | Self::Rgba4444
            | Self::RHalf
            | Self::Rg16
            | Self::Yuy2 => Some(2),
            Self::Rgb24 => Some(3),
            Self::Rgba32
            | Self::Argb32
            | Self::Bgra32
            | Self::RgHalf
            | Self::RFloat
            | Self::Rgb9e5Float => Some(4),
            Self::RgbaHalf | Self::RgFloat => Some(8),
            Self::RgbaFloat => Some(16),
            _ => None,
        }
    }

    /// `(block width, block height, bytes per block)` for block-compressed layouts.
    pub fn block_layout(self) -> Option<(usize, usize, usize)> {
        match self {
            Self::Dxt1 | Self::Bc4 | Self::EtcRgb4 | Self::Etc2Rgb | Self::Etc2Rgba1 | Self::EacR
            | Self::EacRSigned => Some((4, 4, 8)),
            Self::Dxt5
            | Self::Bc5
            | Self::Bc6h
            | Self::Bc7
            | Self::Etc2Rgba8
            | Self::EacRg
            | Self::EacRgSigned => Some((4, 4, 16)),
            Self::AstcRgb(block) | Self::AstcRgba(block) => {
                let edge = usize::from(block);
                Some((edge, edge, 16))
            }
            _ => None,
        }
    }

    /// Stored size of one mip level, when the layout is known.
    pub fn level_size(self, width: u32, height: u32) -> Option<usize> {
        let (w, h) = (width.max(1) as usize, height.max(1) as usize);
        if let Some(bpp) = self.bytes_per_pixel() {
            return Some(w * h * bpp);
        }
        let (bw, bh, bytes) = self.block_layout()?;
        Some(w.div_ceil(bw).max(1) * h.div_ceil(bh).max(1) * bytes)
    }

    /// Stored size of a full mip chain of `mip_count` levels.
    pub fn image_size(self, width: u32, height: u32, mip_count: u32) -> Option<usize> {
        mip_dimensions(width, height, mip_count)
            .map(|(w, h)| self.level_size(w, h))
            .sum()
    }

    /// Whether the layout carries an alpha channel a replacement should fill.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            Self::Alpha8
                | Self::Argb4444
                | Self::Rgba32
                | Self::Argb32
                | Self::Rgba4444
                | Self::Bgra32
                | Self::RgbaHalf
                | Self::RgbaFloat
                | Self::Dxt5
                | Self::Bc7
                | Self::Dxt5Crunched
                | Self::PvrtcRgba2
                | Self::PvrtcRgba4
                | Self::Etc2Rgba1
                | Self::Etc2Rgba8
                | Self::AstcRgba(_)
                | Self::Etc2Rgba8Crunched
        )
    }

    pub fn is_crunched(self) -> bool {
        matches!(
            self,
            Self::Dxt1Crunched
                | Self::Dxt5Crunched
                | Self::EtcRgb4Crunched
                | Self::Etc2Rgba8Crunched
        )
    }

    pub fn name(self) -> String {
        match self {
            Self::AstcRgb(block) => format!("ASTC_RGB_{block}x{block}"),
            Self::AstcRgba(block) => format!("ASTC_RGBA_{block}x{block}"),
            Self::Unknown(id) => format!("Unknown({id})"),
            other => format!("{other:?}"),
        }
    }
}

const ASTC_BLOCKS: [u8; 6] = [4, 5, 6, 8, 10, 12];

fn astc_index(block: u8) -> i32 {
    ASTC_BLOCKS
        .iter()
        .position(|&b| b == block)
        .map_or(0, |i| i as i32)
}

/// Dimensions of each level in a mip chain, halving down to 1.
pub fn mip_dimensions(width: u32, height: u32, mip_count: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..mip_count.max(1)).map(move |level| {
        (
            (width >> level.min(31)).max(1),
            (height >> level.min(31)).max(1),
        )
    })
}

/// Number of levels in a complete chain for these dimensions.
pub fn full_mip_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
