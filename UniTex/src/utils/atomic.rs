//! Temp-file-then-rename writes
//!
//! Every on-disk mutation goes through a [`StagedFile`]: data is written to a
//! sibling temp file and only becomes visible when [`StagedFile::commit`]
//! renames it over the target. Dropping an uncommitted stage removes the temp
//! file and leaves the target untouched.

use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::Result;

/// A pending replacement for `target`.
pub struct StagedFile {
    target: PathBuf,
    temp: NamedTempFile,
}

impl StagedFile {
    /// Stage an empty replacement in the target's directory.
    pub fn new(target: impl AsRef<Path>) -> Result<Self> {
        let target = target.as_ref().to_path_buf();
        let temp = NamedTempFile::new_in(parent_dir(&target))?;
        Ok(Self { target, temp })
    }

    /// Stage a replacement that starts as a copy of `source`.
    pub fn copy_of(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<Self> {
        let mut staged = Self::new(target)?;
        let mut input = File::open(source.as_ref())?;
        std::io::copy(&mut input, staged.temp.as_file_mut())?;
        Ok(staged)
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Path of the temp file holding the staged bytes.
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.temp.as_file_mut().write_all(data)?;
        Ok(())
    }

    /// Overwrite staged bytes at `offset`.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let file = self.temp.as_file_mut();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        Ok(())
    }

    /// Flush to disk and rename over the target.
    pub fn commit(self) -> Result<()> {
        let file = self.temp.as_file();
        file.sync_all()?;
        if let Ok(meta) = fs::metadata(&self.target) {
            file.set_permissions(meta.permissions())?;
        }
        self.temp.persist(&self.target).map_err(|e| e.error)?;
        tracing::debug!("Replaced {}", self.target.display());
        Ok(())
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Atomically replace `target` with `data`.
pub fn write_atomic(target: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let mut staged = StagedFile::new(target)?;
    staged.write_all(data)?;
    staged.commit()
}

/// Atomically replace `target` with the contents of `source`.
pub fn copy_atomic(source: impl AsRef<Path>, target: impl AsRef<Path>) -> Result<()> {
    StagedFile::copy_of(source, target)?.commit()
}
