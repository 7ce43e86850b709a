//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Pristine backups of edited containers
//!
//! A [`BackupStore`] keeps one copy of each container as it was before its
//! first edit, together with copies of the companion `.resS` streams an edit
//! may touch. Once written, a backup is never replaced: restoring always
//! returns to the same pristine state.
//!
//! Layout: `<store>/<file name>-<md5(path)[..12]>/` holds the copies and a
//! `backup.json` describing them. The metadata file is written last, so a
//! slot without it is an interrupted backup and does not count.

mod entry;

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

pub use entry::{BackupEntry, CompanionCopy, ENTRY_FILE};

use crate::error::{Error, Result};
use crate::utils::{StagedFile, canonical_key, copy_atomic, write_atomic};

/// Per-path backup state. The transition is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupState {
    NoBackup,
    BackedUp,
}

/// A directory of pristine container backups.
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    /// Open (creating if needed) a backup directory.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBackupDirectory`] if the path is not a
    /// writable directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();
        let invalid = |reason: String| Error::InvalidBackupDirectory {
            path: root.clone(),
            reason,
        };

        if root.exists() && !root.is_dir() {
            return Err(invalid("not a directory".to_string()));
        }
        fs::create_dir_all(&root).map_err(|e| invalid(e.to_string()))?;
        tempfile::NamedTempFile::new_in(&root).map_err(|e| invalid(format!("not writable: {e}")))?;

        tracing::debug!("Backup store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Slot directory for a container path.
    fn slot(&self, key: &Path) -> PathBuf {
        let name = key
            .file_name()
            .map_or_else(|| "container".to_string(), |n| n.to_string_lossy().into_owned());
        let digest = format!("{:x}", md5::compute(key.to_string_lossy().as_bytes()));
        self.root.join(format!("{name}-{}", &digest[..12]))
    }

    pub fn state(&self, path: impl AsRef<Path>) -> BackupState {
        let key = canonical_key(path);
        if self.slot(&key).join(ENTRY_FILE).is_file() {
            BackupState::BackedUp
        } else {
            BackupState::NoBackup
        }
    }

    /// The backup recorded for `path`, if any.
    pub fn entry(&self, path: impl AsRef<Path>) -> Result<Option<BackupEntry>> {
        let key = canonical_key(path);
        let slot = self.slot(&key);
        let meta = slot.join(ENTRY_FILE);
        if !meta.is_file() {
            return Ok(None);
        }
        read_entry(&slot).map(Some)
    }

    /// Back up `path` unless a backup already exists.
    ///
    /// # Errors
    /// Returns an error if the container cannot be copied.
    pub fn backup(&self, path: impl AsRef<Path>) -> Result<BackupState> {
        self.backup_with_companions(path, &[])
    }

    /// Back up `path` and the companion streams an edit of it may touch.
    ///
    /// An existing backup of the container is left as is; companions it
    /// does not cover yet are added.
    ///
    /// # Errors
    /// Returns an error if a file cannot be copied.
    pub fn backup_with_companions(
        &self,
        path: impl AsRef<Path>,
        companions: &[PathBuf],
    ) -> Result<BackupState> {
        let key = canonical_key(path.as_ref());
        let slot = self.slot(&key);

        let mut entry = match self.entry(&key)? {
            Some(entry) => entry,
            None => {
                fs::create_dir_all(&slot)?;
                let file = key
                    .file_name()
                    .map_or_else(|| "container".to_string(), |n| n.to_string_lossy().into_owned());
                copy_atomic(&key, slot.join(&file))?;
                let (md5, size) = file_digest(&slot.join(&file))?;
                tracing::info!("Backed up {} -> {}", key.display(), slot.display());
                BackupEntry {
                    original: key.clone(),
                    file,
                    md5,
                    size,
                    companions: Vec::new(),
                    created: chrono::Utc::now(),
                    slot: slot.clone(),
                }
            }
        };

        let before = entry.companions.len();
        for companion in companions {
            let companion = canonical_key(companion);
            if entry.covers_companion(&companion) || !companion.is_file() {
                continue;
            }
            let file = format!(
                "{}.companion",
                companion
                    .file_name()
                    .map_or_else(|| "stream".to_string(), |n| n.to_string_lossy().into_owned())
            );
            copy_atomic(&companion, slot.join(&file))?;
            let (md5, _) = file_digest(&slot.join(&file))?;
            tracing::debug!("Backed up companion {}", companion.display());
            entry.companions.push(CompanionCopy {
                original: companion,
                file,
                md5,
            });
        }

        let is_new = !slot.join(ENTRY_FILE).is_file();
        if is_new || entry.companions.len() != before {
            write_atomic(slot.join(ENTRY_FILE), &serde_json::to_vec_pretty(&entry)?)?;
        }
        Ok(BackupState::BackedUp)
    }

    /// Copy the pristine backup of `path` (and its companions) back in place.
    ///
    /// Every copy is checked against `backup.json` and staged before the
    /// first live file is replaced. The backup is kept, so restoring twice
    /// yields the same bytes.
    ///
    /// # Errors
    /// Returns [`Error::NoBackup`] if `path` was never backed up, or
    /// [`Error::InvalidBackupDirectory`] if a copy is missing or altered;
    /// nothing is written in either case.
    pub fn restore(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let entry = self.entry(path)?.ok_or_else(|| Error::NoBackup {
            path: path.to_path_buf(),
        })?;

        verify_copy(&entry, &entry.backup_path(), &entry.md5)?;
        for companion in &entry.companions {
            verify_copy(&entry, &entry.companion_path(companion), &companion.md5)?;
        }

        let mut staged = vec![StagedFile::copy_of(entry.backup_path(), &entry.original)?];
        for companion in &entry.companions {
            staged.push(StagedFile::copy_of(
                entry.companion_path(companion),
                &companion.original,
            )?);
        }
        for file in staged {
            file.commit()?;
        }
        tracing::info!("Restored {} from {}", entry.original.display(), entry.slot.display());
        Ok(())
    }

    /// Pristine copy of `file`, which is either `container` itself or one
    /// of the companion streams backed up with it.
    ///
    /// # Errors
    /// Returns [`Error::NoBackup`] if no pristine copy of `file` exists.
    pub fn pristine_path(&self, container: impl AsRef<Path>, file: impl AsRef<Path>) -> Result<PathBuf> {
        let container = container.as_ref();
        let entry = self.entry(container)?.ok_or_else(|| Error::NoBackup {
            path: container.to_path_buf(),
        })?;

        let file = canonical_key(file);
        if file == entry.original {
            return Ok(entry.backup_path());
        }
        entry
            .companion(&file)
            .map(|companion| entry.companion_path(companion))
            .ok_or(Error::NoBackup { path: file })
    }

    /// Every backup in the store, sorted by original path.
    ///
    /// # Errors
    /// Returns an error if the store directory cannot be read.
    pub fn list(&self) -> Result<Vec<BackupEntry>> {
        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&self.root)? {
            let slot = dir_entry?.path();
            if !slot.join(ENTRY_FILE).is_file() {
                continue;
            }
            match read_entry(&slot) {
                Ok(entry) => entries.push(entry),
                Err(err) => tracing::warn!("Skipping backup {}: {err}", slot.display()),
            }
        }
        entries.sort_by(|a, b| a.original.cmp(&b.original));
        Ok(entries)
    }
}

/// Check that a copy exists and still has the recorded checksum.
fn verify_copy(entry: &BackupEntry, copy: &Path, expected: &str) -> Result<()> {
    let invalid = |reason: String| Error::InvalidBackupDirectory {
        path: entry.slot.clone(),
        reason,
    };
    if !copy.is_file() {
        return Err(invalid(format!("{} is missing", copy.display())));
    }
    let (md5, _) = file_digest(copy)?;
    if !expected.is_empty() && md5 != expected {
        return Err(invalid(format!(
            "checksum of {} does not match {ENTRY_FILE}",
            copy.display()
        )));
    }
    Ok(())
}

fn read_entry(slot: &Path) -> Result<BackupEntry> {
    let content = fs::read(slot.join(ENTRY_FILE))?;
    let mut entry: BackupEntry = serde_json::from_slice(&content)?;
    entry.slot = slot.to_path_buf();
    Ok(entry)
}

/// MD5 (hex) and size of a file, streamed.
fn file_digest(path: &Path) -> Result<(String, u64)> {
    let mut file = File::open(path)?;
    let mut hasher = md5::Context::new();
    let mut buffer = [0u8; 8192];
    let mut size = 0u64;

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.consume(&buffer[..bytes_read]);
        size += bytes_read as u64;
    }

    Ok((format!("{:x}", hasher.compute()), size))
}
