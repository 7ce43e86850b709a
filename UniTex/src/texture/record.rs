//! Texture records and their byte locations

use std::fmt;
use std::str::FromStr;

use super::format::TextureFormat;

/// Identifier of an object within a container.
///
/// `file` indexes the serialized files of the container (always 0 for a
/// plain `.assets` file), `path_id` is Unity's object id within that file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId {
    pub file: usize,
    pub path_id: i64,
}

impl TextureId {
    pub fn new(file: usize, path_id: i64) -> Self {
        Self { file, path_id }
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file == 0 {
            write!(f, "{}", self.path_id)
        } else {
            write!(f, "{}:{}", self.file, self.path_id)
        }
    }
}

impl FromStr for TextureId {
    type Err = String;

    /// Parses `path_id` or `file:path_id`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid texture id '{s}' (expected PATH_ID or FILE:PATH_ID)");
        match s.split_once(':') {
            Some((file, path_id)) => Ok(Self {
                file: file.trim().parse().map_err(|_| invalid())?,
                path_id: path_id.trim().parse().map_err(|_| invalid())?,
            }),
            None => Ok(Self {
                file: 0,
                path_id: s.trim().parse().map_err(|_| invalid())?,
            }),
        }
    }
}

/// Which buffer of a container holds a byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// The container's own bytes (the decompressed stream for bundles).
    Main,
    /// A companion stream, by index into the container's companion list.
    Companion(usize),
}

/// A byte range inside one of a container's buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub source: DataSource,
    /// Offset from the start of `source`.
    pub offset: u64,
    pub len: usize,
}

impl ByteRange {
    pub fn end(&self) -> u64 {
        self.offset + self.len as u64
    }
}

/// One Texture2D inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRecord {
    pub id: TextureId,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mip_count: u32,
    pub image_count: u32,
    pub is_readable: bool,
    /// Encoded pixel data, inline or in a companion stream.
    pub location: ByteRange,
}

impl TextureRecord {
    /// Whether the pixel data lives outside the serialized object.
    pub fn is_external(&self) -> bool {
        matches!(self.location.source, DataSource::Companion(_))
    }

    /// Whether a replacement image should carry an alpha channel.
    pub fn wants_alpha(&self) -> bool {
        self.format.has_alpha()
    }

    /// Name for messages, falling back to the id for unnamed textures.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("#{}", self.id)
        } else {
            self.name.clone()
        }
    }

    /// Size of the top mip level, when the layout is known.
    pub fn level0_size(&self) -> Option<usize> {
        self.format.level_size(self.width, self.height)
    }

    /// Size a full payload for this record should have.
    pub fn expected_payload_size(&self) -> Option<usize> {
        self.format
            .image_size(self.width, self.height, self.mip_count)
            .map(|chain| chain * self.image_count.max(1) as usize)
    }
}
