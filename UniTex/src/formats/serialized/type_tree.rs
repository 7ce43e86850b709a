//! Type trees: per-class field layouts stored in serialized-file metadata
//!
//! Nodes are kept flat in pre-order with their depth, the way the blob format
//! stores them; child lists are derived once after reading.

use crate::error::{Error, Result};
use crate::utils::BinaryReader;

use super::common_strings::common_string;

/// Field is an array (`vector`, `map`, `TypelessData` payloads).
pub const FLAG_ARRAY: u32 = 0x1;
/// Stream is aligned to 4 bytes after this field.
pub const META_ALIGN: i32 = 0x4000;

/// Blob node size before the v19 reference hash was added.
const BLOB_NODE_SIZE: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTreeNode {
    pub level: u8,
    pub type_name: String,
    pub name: String,
    pub byte_size: i32,
    pub index: i32,
    pub type_flags: u32,
    pub meta_flag: i32,
}

impl TypeTreeNode {
    pub fn is_array(&self) -> bool {
        self.type_flags & FLAG_ARRAY != 0 || self.type_name == "Array"
    }

    pub fn aligns(&self) -> bool {
        self.meta_flag & META_ALIGN != 0
    }
}

/// A class layout: node 0 is the root (the class itself).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTree {
    nodes: Vec<TypeTreeNode>,
    children: Vec<Vec<usize>>,
}

impl TypeTree {
    pub fn from_nodes(nodes: Vec<TypeTreeNode>) -> Self {
        let mut children = vec![Vec::new(); nodes.len()];
        let mut stack: Vec<usize> = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            while let Some(&top) = stack.last() {
                if nodes[top].level < node.level {
                    break;
                }
                stack.pop();
            }
            if let Some(&parent) = stack.last() {
                children[parent].push(i);
            }
            stack.push(i);
        }
        Self { nodes, children }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, index: usize) -> &TypeTreeNode {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[TypeTreeNode] {
        &self.nodes
    }

    pub fn children(&self, index: usize) -> &[usize] {
        &self.children[index]
    }

    /// Read the compact blob form (serialized-file version 10 and 12+).
    pub fn read_blob(reader: &mut BinaryReader<'_>, version: u32) -> Result<Self> {
        let node_count = reader.read_len()?;
        let string_size = reader.read_len()?;
        let node_size = if version >= 19 {
            BLOB_NODE_SIZE + 8
        } else {
            BLOB_NODE_SIZE
        };
        if node_count.saturating_mul(node_size) > reader.remaining() {
            return Err(Error::Corrupt {
                offset: reader.position(),
                message: format!("type tree claims {node_count} nodes"),
            });
        }

        let mut raw = Vec::with_capacity(node_count);
        for _ in 0..node_count {
            let _version = reader.read_u16()?;
            let level = reader.read_u8()?;
            let type_flags = u32::from(reader.read_u8()?);
            let type_offset = reader.read_u32()?;
            let name_offset = reader.read_u32()?;
            let byte_size = reader.read_i32()?;
            let index = reader.read_i32()?;
            let meta_flag = reader.read_i32()?;
            if version >= 19 {
                let _ref_type_hash = reader.read_u64()?;
            }
            raw.push((level, type_flags, type_offset, name_offset, byte_size, index, meta_flag));
        }

        let strings = reader.read_bytes(string_size)?;
        let nodes = raw
            .into_iter()
            .map(
                |(level, type_flags, type_offset, name_offset, byte_size, index, meta_flag)| {
                    Ok(TypeTreeNode {
                        level,
                        type_name: resolve_string(strings, type_offset)?,
                        name: resolve_string(strings, name_offset)?,
                        byte_size,
                        index,
                        type_flags,
                        meta_flag,
                    })
                },
            )
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_nodes(nodes))
    }

    /// Read the recursive legacy form (serialized-file versions 9 and 11).
    pub fn read_legacy(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let mut nodes = Vec::new();
        read_legacy_node(reader, 0, &mut nodes)?;
        Ok(Self::from_nodes(nodes))
    }
}

fn read_legacy_node(
    reader: &mut BinaryReader<'_>,
    level: u8,
    nodes: &mut Vec<TypeTreeNode>,
) -> Result<()> {
    let type_name = reader.read_cstr()?;
    let name = reader.read_cstr()?;
    let byte_size = reader.read_i32()?;
    let index = reader.read_i32()?;
    let type_flags = reader.read_u32()?;
    let _version = reader.read_i32()?;
    let meta_flag = reader.read_i32()?;
    nodes.push(TypeTreeNode {
        level,
        type_name,
        name,
        byte_size,
        index,
        type_flags,
        meta_flag,
    });

    let child_count = reader.read_len()?;
    if level == u8::MAX {
        return Err(Error::Corrupt {
            offset: reader.position(),
            message: "type tree nested too deeply".to_string(),
        });
    }
    for _ in 0..child_count {
        read_legacy_node(reader, level + 1, nodes)?;
    }
    Ok(())
}

fn resolve_string(local: &[u8], offset: u32) -> Result<String> {
    if offset & 0x8000_0000 != 0 {
        let common = offset & 0x7FFF_FFFF;
        return Ok(common_string(common)
            .map(str::to_string)
            .unwrap_or_else(|| format!("<common {common}>")));
    }
    let start = offset as usize;
    let tail = local.get(start..).ok_or_else(|| Error::Corrupt {
        offset: start,
        message: "type tree string offset out of range".to_string(),
    })?;
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, WriteBytesExt};

    fn node(level: u8, type_name: &str, name: &str) -> TypeTreeNode {
        TypeTreeNode {
            level,
            type_name: type_name.to_string(),
            name: name.to_string(),
            byte_size: -1,
            index: 0,
            type_flags: 0,
            meta_flag: 0,
        }
    }

    #[test]
    fn test_children_from_levels() {
        let tree = TypeTree::from_nodes(vec![
            node(0, "Texture2D", "Base"),
            node(1, "string", "m_Name"),
            node(2, "Array", "Array"),
            node(3, "int", "size"),
            node(3, "char", "data"),
            node(1, "int", "m_Width"),
        ]);
        assert_eq!(tree.children(0), &[1, 5]);
        assert_eq!(tree.children(1), &[2]);
        assert_eq!(tree.children(2), &[3, 4]);
        assert!(tree.children(5).is_empty());
    }

    #[test]
    fn test_blob_mixes_common_and_local_strings() {
        let mut data = Vec::new();
        data.write_i32::<LittleEndian>(2).unwrap();
        data.write_i32::<LittleEndian>(11).unwrap();
        // root: Texture2D / Base from the common table
        data.write_u16::<LittleEndian>(1).unwrap();
        data.push(0);
        data.push(0);
        data.write_u32::<LittleEndian>(0x8000_0000 | 874).unwrap();
        data.write_u32::<LittleEndian>(0x8000_0000 | 55).unwrap();
        data.write_i32::<LittleEndian>(-1).unwrap();
        data.write_i32::<LittleEndian>(0).unwrap();
        data.write_i32::<LittleEndian>(0).unwrap();
        // child: TypelessData / "image data" from the local buffer
        data.write_u16::<LittleEndian>(1).unwrap();
        data.push(1);
        data.push(1);
        data.write_u32::<LittleEndian>(0x8000_0000 | 894).unwrap();
        data.write_u32::<LittleEndian>(0).unwrap();
        data.write_i32::<LittleEndian>(-1).unwrap();
        data.write_i32::<LittleEndian>(1).unwrap();
        data.write_i32::<LittleEndian>(0x4001).unwrap();
        data.extend_from_slice(b"image data\0");

        let mut reader = BinaryReader::new(&data, false);
        let tree = TypeTree::read_blob(&mut reader, 17).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.node(0).type_name, "Texture2D");
        assert_eq!(tree.node(0).name, "Base");
        assert_eq!(tree.node(1).type_name, "TypelessData");
        assert_eq!(tree.node(1).name, "image data");
        assert!(tree.node(1).is_array());
        assert!(tree.node(1).aligns());
        assert_eq!(reader.remaining(), 0);
    }
}
