//! `SerializedFile` reader (`.assets`, `level<N>`, `CAB-*` bundle nodes)
//!
//! Reads the header, the type table and the object table. Object payloads
//! are left in place; callers decode the classes they care about through
//! [`value::read_object`] or a version-keyed layout.
//!
//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT

pub mod common_strings;
pub mod header;
pub mod type_tree;
pub mod value;

use crate::error::{Error, Result};
use crate::formats::common::UnityVersion;
use crate::utils::BinaryReader;

pub use header::SerializedHeader;
pub use type_tree::{TypeTree, TypeTreeNode};
pub use value::{Value, read_object};

/// Class id of `MonoBehaviour`, whose type entries carry a script hash.
const CLASS_MONO_BEHAVIOUR: i32 = 114;

/// One entry of the type table.
#[derive(Debug, Clone, Default)]
pub struct SerializedType {
    pub class_id: i32,
    pub is_stripped: bool,
    pub script_type_index: i16,
    /// Empty when the file was built without type trees.
    pub tree: TypeTree,
}

/// One entry of the object table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectInfo {
    pub path_id: i64,
    /// Absolute offset of the object payload in the file buffer.
    pub byte_start: usize,
    pub byte_size: usize,
    pub class_id: i32,
    /// Index into [`SerializedFile::types`], when resolvable.
    pub type_index: Option<usize>,
}

/// Parsed metadata of a serialized file.
#[derive(Debug, Clone)]
pub struct SerializedFile {
    pub header: SerializedHeader,
    pub unity_version: UnityVersion,
    pub target_platform: i32,
    pub enable_type_tree: bool,
    pub types: Vec<SerializedType>,
    pub objects: Vec<ObjectInfo>,
}

impl SerializedFile {
    /// Whether `data` starts with a plausible serialized-file header.
    pub fn looks_like(data: &[u8]) -> bool {
        SerializedHeader::looks_like(data)
    }

    /// Parse the metadata of a serialized file held in `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = SerializedHeader::read(data)?;
        let version = header.version;
        let mut reader = BinaryReader::at(data, header.header_size(), header.big_endian);

        let unity_version = reader.read_cstr()?;
        let target_platform = reader.read_i32()?;
        let enable_type_tree = if version >= 13 {
            reader.read_bool()?
        } else {
            true
        };

        let type_count = reader.read_len()?;
        let mut types = Vec::with_capacity(type_count.min(4096));
        for _ in 0..type_count {
            types.push(read_serialized_type(&mut reader, version, enable_type_tree)?);
        }

        let big_id_enabled = if (7..14).contains(&version) {
            reader.read_i32()? != 0
        } else {
            false
        };

        let object_count = reader.read_len()?;
        let mut objects = Vec::with_capacity(object_count.min(1 << 16));
        for _ in 0..object_count {
            let object = read_object_info(&mut reader, &header, big_id_enabled, &types)?;
            let end = object.byte_start.checked_add(object.byte_size);
            if end.is_none_or(|end| end > data.len()) {
                return Err(Error::Corrupt {
                    offset: reader.position(),
                    message: format!(
                        "object {} of {} bytes at {} runs past end of file",
                        object.path_id, object.byte_size, object.byte_start
                    ),
                });
            }
            objects.push(object);
        }

        tracing::debug!(
            "Serialized file v{version}, Unity {unity_version}, {} types, {} objects",
            types.len(),
            objects.len()
        );

        Ok(Self {
            header,
            unity_version: UnityVersion::parse(&unity_version),
            target_platform,
            enable_type_tree,
            types,
            objects,
        })
    }

    /// Byte order of object payloads.
    pub fn big_endian(&self) -> bool {
        self.header.big_endian
    }

    pub fn format_version(&self) -> u32 {
        self.header.version
    }

    /// Type tree for an object, if the file carries one for its class.
    pub fn type_tree(&self, object: &ObjectInfo) -> Option<&TypeTree> {
        object
            .type_index
            .and_then(|i| self.types.get(i))
            .map(|t| &t.tree)
            .filter(|tree| !tree.is_empty())
    }
}

fn read_serialized_type(
    reader: &mut BinaryReader<'_>,
    version: u32,
    enable_type_tree: bool,
) -> Result<SerializedType> {
    let class_id = reader.read_i32()?;
    let is_stripped = if version >= 16 { reader.read_bool()? } else { false };
    let script_type_index = if version >= 17 { reader.read_i16()? } else { -1 };

    if version >= 13 {
        let has_script_id = (version < 16 && class_id < 0)
            || (version >= 16 && class_id == CLASS_MONO_BEHAVIOUR);
        if has_script_id {
            reader.skip(16)?;
        }
        // old type hash
        reader.skip(16)?;
    }

    let mut tree = TypeTree::default();
    if enable_type_tree {
        tree = if version >= 12 || version == 10 {
            TypeTree::read_blob(reader, version)?
        } else {
            TypeTree::read_legacy(reader)?
        };
        if version >= 21 {
            let dependency_count = reader.read_len()?;
            reader.skip(dependency_count.saturating_mul(4))?;
        }
    }

    Ok(SerializedType {
        class_id,
        is_stripped,
        script_type_index,
        tree,
    })
}

fn read_object_info(
    reader: &mut BinaryReader<'_>,
    header: &SerializedHeader,
    big_id_enabled: bool,
    types: &[SerializedType],
) -> Result<ObjectInfo> {
    let version = header.version;
    let path_id = if big_id_enabled {
        reader.read_i64()?
    } else if version < 14 {
        i64::from(reader.read_i32()?)
    } else {
        reader.align(4)?;
        reader.read_i64()?
    };

    let relative_start = if version >= 22 {
        u64::try_from(reader.read_i64()?).map_err(|_| Error::Corrupt {
            offset: reader.position(),
            message: format!("object {path_id} has a negative offset"),
        })?
    } else {
        u64::from(reader.read_u32()?)
    };
    let byte_start = relative_start
        .checked_add(header.data_offset)
        .and_then(|start| usize::try_from(start).ok())
        .ok_or_else(|| Error::Corrupt {
            offset: reader.position(),
            message: format!("object {path_id} offset overflows"),
        })?;
    let byte_size = reader.read_u32()? as usize;
    let type_id = reader.read_i32()?;

    let (class_id, type_index) = if version < 16 {
        let class_id = i32::from(reader.read_u16()?);
        let index = types.iter().position(|t| t.class_id == class_id);
        (class_id, index)
    } else {
        let index = usize::try_from(type_id).ok().filter(|&i| i < types.len());
        let class_id = index.map_or(type_id, |i| types[i].class_id);
        (class_id, index)
    };

    if version < 11 {
        let _is_destroyed = reader.read_u16()?;
    }
    if (11..17).contains(&version) {
        let _script_type_index = reader.read_i16()?;
    }
    if version == 15 || version == 16 {
        let _stripped = reader.read_u8()?;
    }

    Ok(ObjectInfo {
        path_id,
        byte_start,
        byte_size,
        class_id,
        type_index,
    })
}
