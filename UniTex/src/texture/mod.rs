//! Texture2D records: format tags, field decoding and lookup

pub mod fields;
pub mod format;
pub mod locator;
pub mod record;

pub use fields::{CLASS_TEXTURE2D, StreamData, Texture2DFields, read_texture2d};
pub use format::{TextureFormat, full_mip_count, mip_dimensions};
pub use locator::{find_texture, find_texture_by_name, list_textures, resolve, unreadable_textures};
pub use record::{ByteRange, DataSource, TextureId, TextureRecord};
