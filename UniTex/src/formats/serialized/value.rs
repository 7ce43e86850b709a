//! Type-tree driven object reader
//!
//! Walks a [`TypeTree`] over object bytes and produces a dynamic [`Value`].
//! Byte arrays are not copied: they come back as a range into the source
//! buffer so callers can patch them in place.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::utils::BinaryReader;

use super::type_tree::TypeTree;

/// Arrays longer than this are treated as corrupt.
const MAX_ELEMENTS: usize = 1 << 28;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    /// Raw byte payload located at `offset..offset + len` in the source buffer.
    Bytes { offset: usize, len: usize },
    Array(Vec<Value>),
    Struct(IndexMap<String, Value>),
}

impl Value {
    /// Field lookup on a struct value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Self::Struct(fields) => fields.get(field),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            Self::UInt(v) => i64::try_from(v).ok(),
            Self::Bool(v) => Some(i64::from(v)),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::UInt(v) => Some(v),
            Self::Int(v) => u64::try_from(v).ok(),
            Self::Bool(v) => Some(u64::from(v)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            Self::Int(v) => Some(v != 0),
            Self::UInt(v) => Some(v != 0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Byte range for `Bytes` values.
    pub fn as_bytes_range(&self) -> Option<(usize, usize)> {
        match *self {
            Self::Bytes { offset, len } => Some((offset, len)),
            _ => None,
        }
    }
}

/// Read the object rooted at node 0 of `tree`.
pub fn read_object(tree: &TypeTree, reader: &mut BinaryReader<'_>) -> Result<Value> {
    if tree.is_empty() {
        return Err(Error::Corrupt {
            offset: reader.position(),
            message: "empty type tree".to_string(),
        });
    }
    read_node(tree, 0, reader)
}

fn read_node(tree: &TypeTree, index: usize, reader: &mut BinaryReader<'_>) -> Result<Value> {
    let node = tree.node(index);
    let children = tree.children(index);
    let mut align = node.aligns();

    let value = match node.type_name.as_str() {
        "SInt8" => Value::Int(i64::from(reader.read_i8()?)),
        "UInt8" | "char" => Value::UInt(u64::from(reader.read_u8()?)),
        "SInt16" | "short" => Value::Int(i64::from(reader.read_i16()?)),
        "UInt16" | "unsigned short" => Value::UInt(u64::from(reader.read_u16()?)),
        "SInt32" | "int" => Value::Int(i64::from(reader.read_i32()?)),
        "UInt32" | "unsigned int" | "Type*" => Value::UInt(u64::from(reader.read_u32()?)),
        "SInt64" | "long long" => Value::Int(reader.read_i64()?),
        "UInt64" | "unsigned long long" | "FileSize" => Value::UInt(reader.read_u64()?),
        "float" => Value::Float(f64::from(reader.read_f32()?)),
        "double" => Value::Float(reader.read_f64()?),
        "bool" => Value::Bool(reader.read_bool()?),
        "string" => {
            let len = reader.read_len()?;
            let bytes = reader.read_bytes(len)?;
            if let Some(&array) = children.first() {
                align |= tree.node(array).aligns();
            }
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        "TypelessData" => {
            let len = reader.read_len()?;
            let offset = reader.position();
            reader.skip(len)?;
            Value::Bytes { offset, len }
        }
        "Array" => read_array(tree, index, reader)?,
        _ => match children.first() {
            Some(&first) if tree.node(first).type_name == "Array" => {
                align |= tree.node(first).aligns();
                read_array(tree, first, reader)?
            }
            _ => {
                let mut fields = IndexMap::with_capacity(children.len());
                for &child in children {
                    let value = read_node(tree, child, reader)?;
                    fields.insert(tree.node(child).name.clone(), value);
                }
                Value::Struct(fields)
            }
        },
    };

    if align {
        reader.align(4)?;
    }
    Ok(value)
}

/// Read an `Array` node whose children are `size` and `data`.
fn read_array(tree: &TypeTree, array: usize, reader: &mut BinaryReader<'_>) -> Result<Value> {
    let count_offset = reader.position();
    let count = reader.read_len()?;
    if count > MAX_ELEMENTS {
        return Err(Error::Corrupt {
            offset: count_offset,
            message: format!("array of {count} elements"),
        });
    }
    let Some(&element) = tree.children(array).get(1) else {
        return Err(Error::Corrupt {
            offset: count_offset,
            message: format!("array node '{}' has no element type", tree.node(array).name),
        });
    };

    let element_node = tree.node(element);
    let single_byte = matches!(element_node.type_name.as_str(), "UInt8" | "SInt8" | "char");
    if single_byte && !element_node.aligns() {
        let offset = reader.position();
        reader.skip(count)?;
        return Ok(Value::Bytes { offset, len: count });
    }

    let mut items = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        items.push(read_node(tree, element, reader)?);
    }
    Ok(Value::Array(items))
}
