//! Export of decoded textures to PNG or TGA

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::{ChannelLayout, RasterImage};
use crate::error::Result;

/// Raster file format for exported textures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Tga,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Tga => "tga",
        }
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Tga => image::ImageFormat::Tga,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "tga" => Ok(Self::Tga),
            other => Err(format!("unknown export format '{other}' (expected png or tga)")),
        }
    }
}

/// Write `image` as PNG, optionally dropping its alpha channel.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn export_png(image: &RasterImage, path: impl AsRef<Path>, strip_alpha: bool) -> Result<()> {
    export(image, path, ExportFormat::Png, strip_alpha)
}

/// Write `image` as TGA.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn export_tga(image: &RasterImage, path: impl AsRef<Path>) -> Result<()> {
    export(image, path, ExportFormat::Tga, false)
}

/// Write `image` in `format`.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn export(
    image: &RasterImage,
    path: impl AsRef<Path>,
    format: ExportFormat,
    strip_alpha: bool,
) -> Result<()> {
    let path = path.as_ref();
    let dynamic = if strip_alpha && image.has_alpha() {
        image.clone().with_layout(ChannelLayout::Rgb).to_dynamic()
    } else {
        image.to_dynamic()
    };
    dynamic.save_with_format(path, format.image_format())?;
    tracing::debug!("Exported {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> RasterImage {
        RasterImage::new(2, 2, ChannelLayout::Rgba, [10, 20, 30, 128].repeat(4)).unwrap()
    }

    #[test]
    fn test_png_keeps_or_strips_alpha() {
        let temp = TempDir::new().unwrap();
        let with_alpha = temp.path().join("a.png");
        let without = temp.path().join("b.png");
        export_png(&sample(), &with_alpha, false).unwrap();
        export_png(&sample(), &without, true).unwrap();

        assert_eq!(RasterImage::load(&with_alpha).unwrap(), sample());
        let stripped = RasterImage::load(&without).unwrap();
        assert_eq!(stripped.layout, ChannelLayout::Rgb);
        assert_eq!(&stripped.pixels[..3], &[10, 20, 30]);
    }

    #[test]
    fn test_tga_export() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.tga");
        export_tga(&sample(), &path).unwrap();
        assert_eq!(RasterImage::load(&path).unwrap(), sample());
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("PNG".parse::<ExportFormat>().unwrap(), ExportFormat::Png);
        assert_eq!("tga".parse::<ExportFormat>().unwrap(), ExportFormat::Tga);
        assert!("dds".parse::<ExportFormat>().is_err());
    }
}
