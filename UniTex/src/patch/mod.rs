//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! In-place texture patching
//!
//! A commit replaces a record's encoded bytes without moving anything else
//! in the container: the payload must have exactly the record's length.
//! Commits are two-phase. [`PatchWriter::stage`] prepares the new file
//! contents in a temp file next to the target without touching the
//! container or the live file; [`StagedPatch::apply`] renames it into place
//! and only then updates the in-memory container.

use std::fs;
use std::ops::Range;
use std::path::PathBuf;

use crate::backup::BackupStore;
use crate::container::{CompanionLocation, Container};
use crate::error::{Error, Result};
use crate::formats::bundle::{BundleArchive, rebuild_bundle};
use crate::texture::{DataSource, TextureId, TextureRecord, find_texture};
use crate::utils::StagedFile;

/// Commits encoded texture data to containers on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatchWriter<'a> {
    backups: Option<&'a BackupStore>,
}

impl<'a> PatchWriter<'a> {
    /// A writer that does not take backups.
    pub fn new() -> Self {
        Self { backups: None }
    }

    /// A writer that backs up each container before its first edit.
    pub fn with_backups(store: &'a BackupStore) -> Self {
        Self {
            backups: Some(store),
        }
    }

    /// Replace the encoded bytes of texture `id` and persist the container.
    ///
    /// # Errors
    /// Returns [`Error::SizeMismatch`] if `encoded` differs in length from
    /// the record's byte range; nothing is written in that case. I/O
    /// failures leave both the live file and `container` unchanged.
    pub fn commit(&self, container: &mut Container, id: TextureId, encoded: &[u8]) -> Result<()> {
        self.stage(container, id, encoded)?.apply(container)
    }

    /// Prepare a commit without touching the live file or `container`.
    ///
    /// # Errors
    /// Returns [`Error::TextureNotFound`] or [`Error::SizeMismatch`] before
    /// any file is created.
    pub fn stage(&self, container: &Container, id: TextureId, encoded: &[u8]) -> Result<StagedPatch<'a>> {
        let record = find_texture(container, id)?;
        check_size(record, encoded)?;

        let (file, update) = match container.main_offset(&record.location) {
            Some(start) if container.bundle.is_some() => stage_bundle(container, start, encoded)?,
            Some(start) => stage_inline(container, start, encoded)?,
            None => stage_companion(container, record, encoded)?,
        };

        tracing::debug!(
            "Staged '{}' ({} bytes) for {}",
            record.display_name(),
            encoded.len(),
            file.target().display()
        );
        Ok(StagedPatch {
            container: container.path.clone(),
            companions: container.companion_files(),
            backups: self.backups,
            file,
            update,
        })
    }
}

fn check_size(record: &TextureRecord, encoded: &[u8]) -> Result<()> {
    if encoded.len() == record.location.len {
        Ok(())
    } else {
        Err(Error::SizeMismatch {
            texture: record.display_name(),
            expected: record.location.len,
            actual: encoded.len(),
        })
    }
}

/// In-memory change applied once the staged file is in place.
enum MemoryUpdate {
    Main { start: usize, bytes: Vec<u8> },
    Bundle { stream: Vec<u8>, archive: BundleArchive },
    None,
}

/// A prepared commit. Dropping it discards the temp file.
pub struct StagedPatch<'a> {
    container: PathBuf,
    companions: Vec<PathBuf>,
    backups: Option<&'a BackupStore>,
    file: StagedFile,
    update: MemoryUpdate,
}

impl StagedPatch<'_> {
    /// The file this patch replaces.
    pub fn target(&self) -> &std::path::Path {
        self.file.target()
    }

    /// Take the backup, rename the staged file into place and update
    /// `container` to match.
    ///
    /// # Errors
    /// Returns an error if the backup or the rename fails; `container` is
    /// left unchanged in that case.
    pub fn apply(self, container: &mut Container) -> Result<()> {
        if let Some(store) = self.backups {
            store.backup_with_companions(&self.container, &self.companions)?;
        }
        let target = self.file.target().to_path_buf();
        self.file.commit()?;

        match self.update {
            MemoryUpdate::Main { start, bytes } => {
                container.data[start..start + bytes.len()].copy_from_slice(&bytes);
            }
            MemoryUpdate::Bundle { stream, archive } => {
                container.data = stream;
                container.bundle = Some(archive);
            }
            MemoryUpdate::None => {}
        }
        tracing::info!("Committed texture patch to {}", target.display());
        Ok(())
    }
}

/// Inline data of a plain serialized file: rewrite the whole file.
fn stage_inline(container: &Container, start: usize, encoded: &[u8]) -> Result<(StagedFile, MemoryUpdate)> {
    let end = start + encoded.len();
    let mut file = StagedFile::new(&container.path)?;
    file.write_all(&container.data[..start])?;
    file.write_all(encoded)?;
    file.write_all(&container.data[end..])?;
    Ok((
        file,
        MemoryUpdate::Main {
            start,
            bytes: encoded.to_vec(),
        },
    ))
}

/// Bundle data stream: recompress only the touched blocks.
fn stage_bundle(container: &Container, start: usize, encoded: &[u8]) -> Result<(StagedFile, MemoryUpdate)> {
    let Some(archive) = container.bundle.as_ref() else {
        return Err(Error::invalid_format(&container.path, "bundle structure missing"));
    };
    let original = fs::read(&container.path)?;

    let mut stream = container.data.clone();
    let dirty: Range<usize> = start..start + encoded.len();
    stream[dirty.clone()].copy_from_slice(encoded);

    let rebuilt = rebuild_bundle(archive, &original, &stream, &[dirty])?;
    let mut file = StagedFile::new(&container.path)?;
    file.write_all(&rebuilt.bytes)?;
    Ok((
        file,
        MemoryUpdate::Bundle {
            stream,
            archive: rebuilt.archive,
        },
    ))
}

/// A `.resS` file on disk: patch a copy of it.
fn stage_companion(
    container: &Container,
    record: &TextureRecord,
    encoded: &[u8],
) -> Result<(StagedFile, MemoryUpdate)> {
    let DataSource::Companion(index) = record.location.source else {
        return Err(Error::invalid_format(&container.path, "inline record outside main buffer"));
    };
    let companion = &container.companions[index];
    let CompanionLocation::File(path) = &companion.location else {
        return Err(Error::invalid_format(&container.path, "bundle companion outside data stream"));
    };

    let mut file = StagedFile::copy_of(path, path)?;
    file.write_at(record.location.offset, encoded)?;
    Ok((file, MemoryUpdate::None))
}
