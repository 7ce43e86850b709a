//! Container loading and object indexing

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::formats::bundle::{is_bundle, read_bundle};
use crate::formats::common::UnityVersion;
use crate::formats::serialized::SerializedFile;
use crate::texture::{
    ByteRange, CLASS_TEXTURE2D, DataSource, Texture2DFields, TextureId, TextureRecord,
    read_texture2d,
};

use super::companion::CompanionResolver;
use super::{Container, ContainerKind, ContainerObject, ObjectKind, SerializedEntry};

pub(super) fn open(path: &Path) -> Result<Container> {
    let data = fs::read(path)?;
    let container = if is_bundle(&data) {
        load_bundle(path, &data)
    } else {
        load_assets(path, data)
    }
    .map_err(|err| match err {
        Error::Io(_) | Error::MissingCompanion { .. } | Error::InvalidFormat { .. } => err,
        other => Error::invalid_format(path, other.to_string()),
    })?;

    let textures = container.objects().filter(|o| o.texture().is_some()).count();
    tracing::info!(
        "Opened {} ({}, Unity {}): {} objects, {} textures",
        path.display(),
        container.kind,
        container
            .unity_version()
            .map_or_else(|| "?".to_string(), ToString::to_string),
        container.object_count(),
        textures
    );
    Ok(container)
}

fn load_assets(path: &Path, data: Vec<u8>) -> Result<Container> {
    if !SerializedFile::looks_like(&data) {
        return Err(Error::invalid_format(
            path,
            "neither a UnityFS bundle nor a serialized file",
        ));
    }
    let file = SerializedFile::parse(&data)?;
    let entry = SerializedEntry {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        base: 0,
        file,
    };

    let mut resolver = CompanionResolver::for_assets(path);
    let mut objects = IndexMap::new();
    index_file(0, &entry, &data, &mut resolver, &mut objects)?;

    Ok(Container {
        path: path.to_path_buf(),
        kind: ContainerKind::Assets,
        data,
        bundle: None,
        files: vec![entry],
        companions: resolver.companions,
        objects,
    })
}

fn load_bundle(path: &Path, data: &[u8]) -> Result<Container> {
    let (archive, stream) = read_bundle(data)?;
    let revision = UnityVersion::parse(&archive.header.unity_revision);

    let mut files = Vec::new();
    for node in archive.nodes.iter().filter(|n| n.is_serialized_file()) {
        let bytes = &stream[node.range()];
        let mut file = SerializedFile::parse(bytes)?;
        if file.unity_version.is_stripped() {
            file.unity_version = revision.clone();
        }
        files.push(SerializedEntry {
            name: node.path.clone(),
            base: node.offset as usize,
            file,
        });
    }
    if files.is_empty() {
        return Err(Error::invalid_format(path, "bundle holds no serialized files"));
    }

    let mut resolver = CompanionResolver::for_bundle(path, &archive.nodes);
    let mut objects = IndexMap::new();
    for (index, entry) in files.iter().enumerate() {
        index_file(index, entry, &stream, &mut resolver, &mut objects)?;
    }
    let companions = resolver.companions;

    Ok(Container {
        path: path.to_path_buf(),
        kind: ContainerKind::Bundle,
        data: stream,
        bundle: Some(archive),
        files,
        companions,
        objects,
    })
}

/// Add every object of one serialized file to the index.
///
/// `data` is the container's main buffer; the file occupies it from
/// `entry.base` on.
fn index_file(
    file_index: usize,
    entry: &SerializedEntry,
    data: &[u8],
    resolver: &mut CompanionResolver<'_>,
    objects: &mut IndexMap<TextureId, ContainerObject>,
) -> Result<()> {
    let file_bytes = &data[entry.base..entry.base + entry.file.header.file_size as usize];

    for info in &entry.file.objects {
        let id = TextureId::new(file_index, info.path_id);
        let kind = if info.class_id == CLASS_TEXTURE2D {
            match read_texture2d(&entry.file, info, file_bytes) {
                Ok(fields) => texture_kind(id, entry.base, fields, resolver)?,
                Err(err) => {
                    tracing::warn!("Texture2D {id} in {}: {err}", entry.name);
                    ObjectKind::Unreadable {
                        name: String::new(),
                        reason: err.to_string(),
                    }
                }
            }
        } else {
            ObjectKind::Other
        };
        objects.insert(
            id,
            ContainerObject {
                id,
                class_id: info.class_id,
                kind,
            },
        );
    }
    Ok(())
}

/// Locate a texture's pixel bytes; a missing companion aborts the load.
fn texture_kind(
    id: TextureId,
    base: usize,
    fields: Texture2DFields,
    resolver: &mut CompanionResolver<'_>,
) -> Result<ObjectKind> {
    let unreadable = |name: &str, reason: String| -> Result<ObjectKind> {
        tracing::warn!("Texture2D {id} '{name}': {reason}");
        Ok(ObjectKind::Unreadable {
            name: name.to_string(),
            reason,
        })
    };

    let location = match fields.stream.as_ref().filter(|s| s.is_used()) {
        Some(stream) => {
            let index = resolver.resolve(&stream.path)?;
            let companion = &resolver.companions[index];
            let end = stream.offset.checked_add(stream.size).ok_or_else(|| Error::Corrupt {
                offset: base,
                message: format!(
                    "Texture2D {id} stream range {}+{} overflows",
                    stream.offset, stream.size
                ),
            })?;
            if end > companion.len {
                return unreadable(
                    &fields.name,
                    format!(
                        "stream range {}..{end} exceeds '{}' ({} bytes)",
                        stream.offset,
                        companion.name,
                        companion.len
                    ),
                );
            }
            ByteRange {
                source: DataSource::Companion(index),
                offset: stream.offset,
                len: stream.size as usize,
            }
        }
        None if fields.image_data.1 > 0 => ByteRange {
            source: DataSource::Main,
            offset: (base + fields.image_data.0) as u64,
            len: fields.image_data.1,
        },
        None => return unreadable(&fields.name, "texture has no pixel data".to_string()),
    };

    if fields.width == 0 || fields.height == 0 {
        return unreadable(
            &fields.name,
            format!("invalid dimensions {}x{}", fields.width, fields.height),
        );
    }

    Ok(ObjectKind::Texture2D(TextureRecord {
        id,
        name: fields.name,
        width: fields.width,
        height: fields.height,
        format: fields.format,
        mip_count: fields.mip_count,
        image_count: fields.image_count,
        is_readable: fields.is_readable,
        location,
    }))
}
