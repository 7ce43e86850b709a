//! BCn block codecs (DXT1, DXT5, BC4, BC5, BC7)

mod decode;
mod encode;

pub use decode::{BcFormat, bc1_colors, decode_bc};
pub use encode::{encode_bc1, encode_bc3, rgb_to_565};

use crate::error::Result;

use super::BlockCodec;

/// [`BlockCodec`] for one BCn layout.
///
/// Decoding goes through bcdec_rs; DXT1 and DXT5 also encode.
#[derive(Debug, Clone, Copy)]
pub struct BcCodec {
    format: BcFormat,
}

impl BcCodec {
    pub const fn new(format: BcFormat) -> Self {
        Self { format }
    }
}

impl BlockCodec for BcCodec {
    fn decode(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
        Ok(decode_bc(data, width as usize, height as usize, self.format))
    }

    fn can_encode(&self) -> bool {
        matches!(self.format, BcFormat::Bc1 | BcFormat::Bc3)
    }

    fn encode(&self, rgba: &[u8], width: u32, height: u32) -> Option<Vec<u8>> {
        match self.format {
            BcFormat::Bc1 => Some(encode_bc1(rgba, width as usize, height as usize)),
            BcFormat::Bc3 => Some(encode_bc3(rgba, width as usize, height as usize)),
            BcFormat::Bc4 | BcFormat::Bc5 | BcFormat::Bc7 => None,
        }
    }
}
