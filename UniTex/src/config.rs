//! User settings (`settings.toml`)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::export::ExportFormat;
use crate::utils::write_atomic;

/// Persisted settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Where pristine backups are kept; see [`Settings::backup_dir`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
    #[serde(default)]
    pub export_format: ExportFormat,
    #[serde(default)]
    pub strip_alpha: bool,
}

impl Settings {
    /// `<config_dir>/unitex/settings.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("unitex").join("settings.toml"))
    }

    /// Load settings from the default location, or defaults if absent.
    ///
    /// # Errors
    /// Returns [`Error::Settings`] if the file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from `path`; a missing file yields defaults.
    ///
    /// # Errors
    /// Returns [`Error::Settings`] if the file cannot be parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Settings {
            message: format!("{}: {e}", path.display()),
        })
    }

    /// Save settings to `path`, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| Error::Settings {
            message: e.to_string(),
        })?;
        write_atomic(path, content.as_bytes())
    }

    /// Backup directory: the configured one, else `<data_dir>/unitex/backups`.
    pub fn backup_dir(&self) -> PathBuf {
        self.backup_dir.clone().unwrap_or_else(default_backup_dir)
    }
}

fn default_backup_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("unitex")
        .join("backups")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("settings.toml");
        let settings = Settings {
            backup_dir: Some(PathBuf::from("/tmp/unitex-backups")),
            export_format: ExportFormat::Tga,
            strip_alpha: true,
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_and_partial_files() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            Settings::load_from(temp.path().join("absent.toml")).unwrap(),
            Settings::default()
        );

        let partial = temp.path().join("partial.toml");
        fs::write(&partial, "strip_alpha = true\n").unwrap();
        let settings = Settings::load_from(&partial).unwrap();
        assert!(settings.strip_alpha);
        assert_eq!(settings.export_format, ExportFormat::Png);
        assert!(settings.backup_dir().ends_with("unitex/backups"));
    }

    #[test]
    fn test_invalid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.toml");
        fs::write(&path, "export_format = \"dds\"\n").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Settings { .. })));
    }
}
