//! Texture lookup over a container's object index

use crate::container::{Container, ObjectKind};
use crate::error::{Error, Result};

use super::record::{TextureId, TextureRecord};

/// Every readable Texture2D in the container, in native object order.
pub fn list_textures(container: &Container) -> Vec<&TextureRecord> {
    container.objects().filter_map(|o| o.texture()).collect()
}

/// Texture2D objects that were found but could not be read, with the reason.
pub fn unreadable_textures(container: &Container) -> Vec<(TextureId, &str, &str)> {
    container
        .objects()
        .filter_map(|o| match &o.kind {
            ObjectKind::Unreadable { name, reason } => Some((o.id, name.as_str(), reason.as_str())),
            _ => None,
        })
        .collect()
}

/// Look up a texture by identifier.
///
/// # Errors
/// Returns [`Error::TextureNotFound`] if no readable Texture2D has this id.
pub fn find_texture(container: &Container, id: TextureId) -> Result<&TextureRecord> {
    container
        .object(id)
        .and_then(|o| o.texture())
        .ok_or_else(|| Error::TextureNotFound(id.to_string()))
}

/// First texture whose name matches exactly.
///
/// # Errors
/// Returns [`Error::TextureNotFound`] if no texture has this name.
pub fn find_texture_by_name<'a>(container: &'a Container, name: &str) -> Result<&'a TextureRecord> {
    container
        .objects()
        .filter_map(|o| o.texture())
        .find(|t| t.name == name)
        .ok_or_else(|| Error::TextureNotFound(name.to_string()))
}

/// Resolve a user query: a `path_id`, a `file:path_id` pair, or a name.
///
/// Numeric queries that match no id fall back to a name lookup, so a
/// texture literally named `"42"` is still reachable.
pub fn resolve<'a>(container: &'a Container, query: &str) -> Result<&'a TextureRecord> {
    if let Some(record) = query
        .parse::<TextureId>()
        .ok()
        .and_then(|id| find_texture(container, id).ok())
    {
        return Ok(record);
    }
    find_texture_by_name(container, query)
}
