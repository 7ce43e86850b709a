//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Opened Unity containers and their object index
//!
//! A [`Container`] owns the bytes of one `.assets` or `.bundle` file (for
//! bundles, the decompressed data stream) together with an ordered index of
//! every object inside it. Texture2D objects are decoded into
//! [`TextureRecord`]s at load time; everything else is kept as an opaque
//! entry so the index mirrors the file's native object order.

mod companion;
mod loader;

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::formats::bundle::BundleArchive;
use crate::formats::common::UnityVersion;
use crate::formats::serialized::SerializedFile;
use crate::texture::{ByteRange, DataSource, TextureId, TextureRecord};

/// Kind of container file, detected from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// A bare serialized file (`.assets`, `level<N>`, `resources.assets`)
    Assets,
    /// A `UnityFS` asset bundle
    Bundle,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assets => "assets",
            Self::Bundle => "bundle",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an indexed object is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Texture2D(TextureRecord),
    /// A Texture2D whose fields or pixel location could not be read.
    Unreadable { name: String, reason: String },
    /// Any other class; kept only for ordering and diagnostics.
    Other,
}

/// An entry of the container's object index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerObject {
    pub id: TextureId,
    pub class_id: i32,
    pub kind: ObjectKind,
}

impl ContainerObject {
    pub fn texture(&self) -> Option<&TextureRecord> {
        match &self.kind {
            ObjectKind::Texture2D(record) => Some(record),
            _ => None,
        }
    }
}

/// A serialized file inside the container.
#[derive(Debug, Clone)]
pub struct SerializedEntry {
    /// File name (bundle node path, or the container's file name)
    pub name: String,
    /// Offset of the file in the container's main buffer
    pub base: usize,
    pub file: SerializedFile,
}

/// Where a companion stream is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanionLocation {
    /// A `.resS` file next to the container on disk.
    File(PathBuf),
    /// A resource node inside the same bundle, by its stream offset.
    BundleNode { offset: u64 },
}

/// A companion data stream referenced by `m_StreamData.path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Companion {
    /// File name as referenced, e.g. `sharedassets0.assets.resS`
    pub name: String,
    pub location: CompanionLocation,
    pub len: u64,
}

/// An opened container file.
#[derive(Debug)]
pub struct Container {
    pub(crate) path: PathBuf,
    pub(crate) kind: ContainerKind,
    /// File bytes for `.assets`, the decompressed data stream for bundles.
    pub(crate) data: Vec<u8>,
    pub(crate) bundle: Option<BundleArchive>,
    pub(crate) files: Vec<SerializedEntry>,
    pub(crate) companions: Vec<Companion>,
    pub(crate) objects: IndexMap<TextureId, ContainerObject>,
}

impl Container {
    /// Open a container and build its object index.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if the file is not a recognized
    /// container, or [`Error::MissingCompanion`] if a texture references a
    /// `.resS` stream that does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        loader::open(path.as_ref())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Engine version of the first serialized file.
    pub fn unity_version(&self) -> Option<&UnityVersion> {
        self.files.first().map(|entry| &entry.file.unity_version)
    }

    pub fn files(&self) -> &[SerializedEntry] {
        &self.files
    }

    pub fn companions(&self) -> &[Companion] {
        &self.companions
    }

    pub fn bundle(&self) -> Option<&BundleArchive> {
        self.bundle.as_ref()
    }

    /// All objects in native order.
    pub fn objects(&self) -> impl Iterator<Item = &ContainerObject> {
        self.objects.values()
    }

    pub fn object(&self, id: TextureId) -> Option<&ContainerObject> {
        self.objects.get(&id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Companion files on disk that edits of this container may touch.
    pub fn companion_files(&self) -> Vec<PathBuf> {
        self.companions
            .iter()
            .filter_map(|c| match &c.location {
                CompanionLocation::File(path) => Some(path.clone()),
                CompanionLocation::BundleNode { .. } => None,
            })
            .collect()
    }

    /// Offset of `range` in the main buffer, when it is stored there.
    pub(crate) fn main_offset(&self, range: &ByteRange) -> Option<usize> {
        match range.source {
            DataSource::Main => Some(range.offset as usize),
            DataSource::Companion(index) => match self.companions.get(index)?.location {
                CompanionLocation::BundleNode { offset } => Some((offset + range.offset) as usize),
                CompanionLocation::File(_) => None,
            },
        }
    }

    /// Read the bytes of `range` from memory or its companion file.
    pub fn read_range(&self, range: &ByteRange) -> Result<Vec<u8>> {
        if let Some(start) = self.main_offset(range) {
            return self
                .data
                .get(start..start + range.len)
                .map(<[u8]>::to_vec)
                .ok_or(Error::UnexpectedEof {
                    offset: start,
                    wanted: range.len,
                    available: self.data.len().saturating_sub(start),
                });
        }

        let path = self.companion_file(range).ok_or_else(|| Error::Corrupt {
            offset: range.offset as usize,
            message: "byte range points at no companion file".to_string(),
        })?;
        read_file_range(path, range.offset, range.len)
    }

    /// Companion file on disk holding `range`, if it lives in one.
    pub fn companion_file(&self, range: &ByteRange) -> Option<&Path> {
        let DataSource::Companion(index) = range.source else {
            return None;
        };
        match &self.companions.get(index)?.location {
            CompanionLocation::File(path) => Some(path),
            CompanionLocation::BundleNode { .. } => None,
        }
    }

    /// Encoded pixel data of a texture.
    pub fn texture_bytes(&self, record: &TextureRecord) -> Result<Vec<u8>> {
        self.read_range(&record.location)
    }
}

/// Read `len` bytes at `offset` from a file on disk.
pub(crate) fn read_file_range(path: &Path, offset: u64, len: usize) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; len];
    file.read_exact(&mut buf)?;
    Ok(buf)
}
