//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! High-level texture operations
//!
//! Chains the locator, codec, conformance and patch stages into the
//! operations a front end calls: replace one texture from an image file,
//! export one texture, or export every texture of a container.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::backup::BackupStore;
use crate::codec::{self, CodecRegistry, RasterImage};
use crate::conform::conform;
use crate::container::{Container, read_file_range};
use crate::error::{Error, Result};
use crate::export::{ExportFormat, export};
use crate::formats::bundle::read_bundle;
use crate::patch::PatchWriter;
use crate::texture::{TextureId, TextureRecord, find_texture, list_textures, resolve};

/// What a replacement did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOutcome {
    pub id: TextureId,
    pub name: String,
    /// Dimensions of the supplied image before conformance.
    pub source_size: (u32, u32),
    /// Dimensions written (the texture's own).
    pub target_size: (u32, u32),
    /// Encoded bytes committed.
    pub bytes: usize,
}

impl ReplaceOutcome {
    pub fn resized(&self) -> bool {
        self.source_size != self.target_size
    }
}

/// Replace the texture matching `query` with the image at `image_path`.
///
/// `query` is a path id, `file:path_id`, or a texture name.
///
/// # Errors
/// Fails if the texture is not found, the image cannot be loaded, the format
/// cannot be encoded, or the commit fails. Nothing is written on failure.
pub fn replace_texture(
    container: &mut Container,
    query: &str,
    image_path: impl AsRef<Path>,
    writer: &PatchWriter<'_>,
    registry: &CodecRegistry,
) -> Result<ReplaceOutcome> {
    let id = resolve(container, query)?.id;
    let image = RasterImage::load(image_path.as_ref())?;
    replace_with_image(container, id, &image, writer, registry)
}

/// Conform, encode and commit `image` as the new pixels of texture `id`.
///
/// # Errors
/// See [`replace_texture`].
pub fn replace_with_image(
    container: &mut Container,
    id: TextureId,
    image: &RasterImage,
    writer: &PatchWriter<'_>,
    registry: &CodecRegistry,
) -> Result<ReplaceOutcome> {
    let record = find_texture(container, id)?.clone();
    let conformed = conform(image, record.width, record.height, record.wants_alpha())?;
    let stored = container.texture_bytes(&record)?;
    let payload = codec::encode_over(&conformed, &record, &stored, registry)?;
    writer.commit(container, id, &payload)?;

    Ok(ReplaceOutcome {
        id,
        name: record.display_name(),
        source_size: (image.width, image.height),
        target_size: (record.width, record.height),
        bytes: payload.len(),
    })
}

/// Decode the texture matching `query` and write it to `output`.
///
/// The file format follows the output extension (`.tga`, else PNG).
///
/// # Errors
/// Fails if the texture is not found, cannot be decoded, or the file
/// cannot be written.
pub fn export_texture(
    container: &Container,
    query: &str,
    output: impl AsRef<Path>,
    strip_alpha: bool,
    registry: &CodecRegistry,
) -> Result<TextureId> {
    let output = output.as_ref();
    let record = resolve(container, query)?;
    let image = codec::decode(container, record, registry)?;
    let format = if output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tga"))
    {
        ExportFormat::Tga
    } else {
        ExportFormat::Png
    };
    export(&image, output, format, strip_alpha)?;
    Ok(record.id)
}

/// Put the pristine bytes of texture `id` back from its container's backup.
///
/// Only the record's own byte range is rewritten, so edits to other
/// textures of the container are kept.
///
/// # Errors
/// Returns [`Error::NoBackup`] if the container, or the companion stream
/// holding the texture, was never backed up.
pub fn restore_texture(
    container: &mut Container,
    id: TextureId,
    store: &BackupStore,
    writer: &PatchWriter<'_>,
) -> Result<()> {
    let record = find_texture(container, id)?.clone();
    let pristine = pristine_bytes(container, &record, store)?;
    writer.commit(container, id, &pristine)?;
    tracing::info!("Restored texture '{}' in {}", record.display_name(), container.path().display());
    Ok(())
}

/// The record's byte range as it is in the backup.
fn pristine_bytes(container: &Container, record: &TextureRecord, store: &BackupStore) -> Result<Vec<u8>> {
    let range = &record.location;
    let Some(start) = container.main_offset(range) else {
        let path = container.companion_file(range).ok_or_else(|| Error::Corrupt {
            offset: range.offset as usize,
            message: "byte range points at no companion file".to_string(),
        })?;
        let copy = store.pristine_path(container.path(), path)?;
        return read_file_range(&copy, range.offset, range.len);
    };

    let copy = store.pristine_path(container.path(), container.path())?;
    if container.bundle().is_none() {
        return read_file_range(&copy, start as u64, range.len);
    }
    let (_, stream) = read_bundle(&fs::read(&copy)?)?;
    stream
        .get(start..start + range.len)
        .map(<[u8]>::to_vec)
        .ok_or(Error::UnexpectedEof {
            offset: start,
            wanted: range.len,
            available: stream.len().saturating_sub(start),
        })
}

/// Progress of a batch export.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
    pub name: String,
}

/// Summary of a batch export.
#[derive(Debug, Clone, Default)]
pub struct ExportAllResult {
    pub success_count: usize,
    pub fail_count: usize,
    /// One line per texture, in container order.
    pub results: Vec<String>,
}

/// Export every texture of `container` into `dest` in parallel.
///
/// Textures that cannot be decoded are counted as failures; the rest are
/// still written. Files are named after the texture, with the path id
/// appended when a name is empty or repeats.
///
/// # Errors
/// Returns an error only if `dest` cannot be created.
pub fn export_all<F>(
    container: &Container,
    dest: &Path,
    format: ExportFormat,
    strip_alpha: bool,
    registry: &CodecRegistry,
    progress: F,
) -> Result<ExportAllResult>
where
    F: Fn(&ExportProgress) + Send + Sync,
{
    fs::create_dir_all(dest)?;
    let records = list_textures(container);
    let names = output_names(&records, format);
    let total = records.len();

    let success_counter = AtomicUsize::new(0);
    let fail_counter = AtomicUsize::new(0);
    let processed = AtomicUsize::new(0);

    let results: Vec<String> = records
        .par_iter()
        .zip(names.par_iter())
        .map(|(record, file_name)| {
            let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(&ExportProgress {
                current,
                total,
                name: record.display_name(),
            });

            let outcome = codec::decode(container, record, registry)
                .and_then(|image| export(&image, dest.join(file_name), format, strip_alpha));
            match outcome {
                Ok(()) => {
                    success_counter.fetch_add(1, Ordering::SeqCst);
                    format!("Exported: {}", file_name.display())
                }
                Err(e) => {
                    fail_counter.fetch_add(1, Ordering::SeqCst);
                    tracing::warn!("Export of '{}' failed: {e}", record.display_name());
                    format!("Failed {}: {e}", record.display_name())
                }
            }
        })
        .collect();

    Ok(ExportAllResult {
        success_count: success_counter.load(Ordering::SeqCst),
        fail_count: fail_counter.load(Ordering::SeqCst),
        results,
    })
}

/// Unique, filesystem-safe output names in container order.
fn output_names(records: &[&TextureRecord], format: ExportFormat) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|record| {
            let base = sanitize(&record.name);
            let stem = if !base.is_empty() && seen.insert(base.clone()) {
                base
            } else {
                let prefix = if base.is_empty() { "texture".to_string() } else { base };
                let id = record.id.to_string().replace(':', "_");
                let mut candidate = format!("{prefix}_{id}");
                let mut n = 2;
                while !seen.insert(candidate.clone()) {
                    candidate = format!("{prefix}_{id}_{n}");
                    n += 1;
                }
                candidate
            };
            PathBuf::from(format!("{stem}.{}", format.extension()))
        })
        .collect()
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{ByteRange, DataSource, TextureFormat};
    use pretty_assertions::assert_eq;

    fn record(path_id: i64, name: &str) -> TextureRecord {
        TextureRecord {
            id: TextureId::new(0, path_id),
            name: name.to_string(),
            width: 1,
            height: 1,
            format: TextureFormat::Rgba32,
            mip_count: 1,
            image_count: 1,
            is_readable: true,
            location: ByteRange {
                source: DataSource::Main,
                offset: 0,
                len: 4,
            },
        }
    }

    #[test]
    fn test_output_names_are_unique() {
        let records = [record(1, "Logo"), record(2, "Logo"), record(3, ""), record(4, "ui/icon")];
        let refs: Vec<&TextureRecord> = records.iter().collect();
        let names = output_names(&refs, ExportFormat::Png);
        assert_eq!(
            names,
            vec![
                PathBuf::from("Logo.png"),
                PathBuf::from("Logo_2.png"),
                PathBuf::from("texture_3.png"),
                PathBuf::from("ui_icon.png"),
            ]
        );
    }

    #[test]
    fn test_output_names_skip_taken_suffix() {
        let records = [record(1, "Logo"), record(3, "Logo_2"), record(2, "Logo")];
        let refs: Vec<&TextureRecord> = records.iter().collect();
        let names = output_names(&refs, ExportFormat::Tga);
        assert_eq!(
            names,
            vec![
                PathBuf::from("Logo.tga"),
                PathBuf::from("Logo_2.tga"),
                PathBuf::from("Logo_2_2.tga"),
            ]
        );
    }
}
