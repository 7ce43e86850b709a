//! Backup metadata (`backup.json`)

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the metadata file inside each backup slot.
pub const ENTRY_FILE: &str = "backup.json";

/// Pristine copy of one companion stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionCopy {
    pub original: PathBuf,
    /// File name of the copy inside the slot.
    pub file: String,
    /// MD5 of the copy, hex.
    #[serde(default)]
    pub md5: String,
}

/// One backed-up container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Canonical path of the live container.
    pub original: PathBuf,
    /// File name of the copy inside the slot.
    pub file: String,
    /// MD5 of the copy, hex.
    pub md5: String,
    pub size: u64,
    #[serde(default)]
    pub companions: Vec<CompanionCopy>,
    pub created: DateTime<Utc>,
    /// Directory holding this entry (not serialized).
    #[serde(skip)]
    pub slot: PathBuf,
}

impl BackupEntry {
    /// Path of the pristine container copy.
    pub fn backup_path(&self) -> PathBuf {
        self.slot.join(&self.file)
    }

    pub fn companion_path(&self, companion: &CompanionCopy) -> PathBuf {
        self.slot.join(&companion.file)
    }

    pub fn covers_companion(&self, original: &Path) -> bool {
        self.companion(original).is_some()
    }

    /// The companion copy taken of `original`, if any.
    pub fn companion(&self, original: &Path) -> Option<&CompanionCopy> {
        self.companions.iter().find(|c| c.original == original)
    }
}
