//! Decoded in-memory bitmaps

use std::path::Path;

use image::{DynamicImage, RgbImage, RgbaImage};

use crate::error::{Error, Result};

/// Per-pixel channel layout of a [`RasterImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Rgb,
    Rgba,
}

impl ChannelLayout {
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        self == Self::Rgba
    }

    pub fn for_alpha(wants_alpha: bool) -> Self {
        if wants_alpha { Self::Rgba } else { Self::Rgb }
    }
}

/// An 8-bit RGB or RGBA bitmap, rows top-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub layout: ChannelLayout,
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Wrap a pixel buffer, checking its length against the dimensions.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimensions`] for a zero dimension, or
    /// [`Error::Corrupt`] if the buffer length does not match.
    pub fn new(width: u32, height: u32, layout: ChannelLayout, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize * layout.channels();
        if pixels.len() != expected {
            return Err(Error::Corrupt {
                offset: 0,
                message: format!(
                    "{width}x{height} {layout:?} image needs {expected} bytes, got {}",
                    pixels.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            pixels,
        })
    }

    /// Build an image of `layout` from RGBA8 pixels, dropping alpha for RGB.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>, layout: ChannelLayout) -> Self {
        let pixels = match layout {
            ChannelLayout::Rgba => rgba,
            ChannelLayout::Rgb => rgba
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
        };
        Self {
            width,
            height,
            layout,
            pixels,
        }
    }

    pub fn has_alpha(&self) -> bool {
        self.layout.has_alpha()
    }

    /// Pixels as RGBA8; RGB images get an opaque alpha channel.
    pub fn to_rgba(&self) -> Vec<u8> {
        match self.layout {
            ChannelLayout::Rgba => self.pixels.clone(),
            ChannelLayout::Rgb => self
                .pixels
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect(),
        }
    }

    /// Convert to `layout`, synthesizing opaque alpha or dropping it.
    #[must_use]
    pub fn with_layout(self, layout: ChannelLayout) -> Self {
        if self.layout == layout {
            return self;
        }
        let rgba = self.to_rgba();
        Self::from_rgba(self.width, self.height, rgba, layout)
    }

    /// Reverse the row order in place.
    pub fn flip_vertical(&mut self) {
        let stride = self.width as usize * self.layout.channels();
        let rows = self.height as usize;
        for y in 0..rows / 2 {
            let (top, bottom) = self.pixels.split_at_mut((rows - 1 - y) * stride);
            top[y * stride..(y + 1) * stride].swap_with_slice(&mut bottom[..stride]);
        }
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        match self.layout {
            ChannelLayout::Rgb => RgbImage::from_raw(self.width, self.height, self.pixels.clone())
                .map_or_else(|| DynamicImage::new_rgb8(self.width, self.height), DynamicImage::ImageRgb8),
            ChannelLayout::Rgba => RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
                .map_or_else(
                    || DynamicImage::new_rgba8(self.width, self.height),
                    DynamicImage::ImageRgba8,
                ),
        }
    }

    /// Convert from any `image` buffer; the layout follows its alpha channel.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        if image.color().has_alpha() {
            Self {
                width,
                height,
                layout: ChannelLayout::Rgba,
                pixels: image.into_rgba8().into_raw(),
            }
        } else {
            Self {
                width,
                height,
                layout: ChannelLayout::Rgb,
                pixels: image.into_rgb8().into_raw(),
            }
        }
    }

    /// Load a replacement image (PNG, TGA, JPEG or BMP).
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let image = image::open(path.as_ref())?;
        Ok(Self::from_dynamic(image))
    }
}
