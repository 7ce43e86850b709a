//! Image conformance
//!
//! Brings a replacement image to the exact dimensions and channel layout of
//! the texture it replaces.

use image::imageops::{self, FilterType};
use image::{RgbImage, RgbaImage};

use crate::codec::{ChannelLayout, RasterImage};
use crate::error::{Error, Result};

/// Resample `source` to `width` x `height` and fix its alpha channel.
///
/// Resampling uses Lanczos3 and only happens when the dimensions differ.
/// A missing alpha channel is synthesized fully opaque; an unwanted one is
/// dropped, not composited.
///
/// # Errors
/// Returns [`Error::InvalidDimensions`] if either target dimension is zero.
pub fn conform(source: &RasterImage, width: u32, height: u32, wants_alpha: bool) -> Result<RasterImage> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }

    let resized = if (source.width, source.height) == (width, height) {
        source.clone()
    } else {
        tracing::debug!(
            "Resampling {}x{} -> {width}x{height}",
            source.width,
            source.height
        );
        resample(source, width, height)?
    };

    Ok(resized.with_layout(ChannelLayout::for_alpha(wants_alpha)))
}

fn resample(source: &RasterImage, width: u32, height: u32) -> Result<RasterImage> {
    let invalid = || Error::InvalidDimensions {
        width: source.width,
        height: source.height,
    };
    let pixels = match source.layout {
        ChannelLayout::Rgb => {
            let buffer = RgbImage::from_raw(source.width, source.height, source.pixels.clone())
                .ok_or_else(invalid)?;
            imageops::resize(&buffer, width, height, FilterType::Lanczos3).into_raw()
        }
        ChannelLayout::Rgba => {
            let buffer = RgbaImage::from_raw(source.width, source.height, source.pixels.clone())
                .ok_or_else(invalid)?;
            imageops::resize(&buffer, width, height, FilterType::Lanczos3).into_raw()
        }
    };
    RasterImage::new(width, height, source.layout, pixels)
}
