//! Resolution of `m_StreamData.path` references

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::formats::bundle::BundleNode;
use crate::utils::file_name_of;

use super::{Companion, CompanionLocation};

/// Finds and caches the companion streams a container references.
pub(super) struct CompanionResolver<'a> {
    container: &'a Path,
    nodes: Option<&'a [BundleNode]>,
    pub(super) companions: Vec<Companion>,
}

impl<'a> CompanionResolver<'a> {
    pub(super) fn for_assets(container: &'a Path) -> Self {
        Self {
            container,
            nodes: None,
            companions: Vec::new(),
        }
    }

    pub(super) fn for_bundle(container: &'a Path, nodes: &'a [BundleNode]) -> Self {
        Self {
            container,
            nodes: Some(nodes),
            companions: Vec::new(),
        }
    }

    /// Index of the companion named by `reference`, registering it on first use.
    ///
    /// # Errors
    /// Returns [`Error::MissingCompanion`] if the stream cannot be found.
    pub(super) fn resolve(&mut self, reference: &str) -> Result<usize> {
        let name = file_name_of(reference);
        if let Some(index) = self.companions.iter().position(|c| c.name == name) {
            return Ok(index);
        }

        let companion = match self.nodes {
            Some(nodes) => self.bundle_companion(nodes, name)?,
            None => self.file_companion(name)?,
        };
        tracing::debug!("Companion '{}' -> {:?}", companion.name, companion.location);
        self.companions.push(companion);
        Ok(self.companions.len() - 1)
    }

    fn bundle_companion(&self, nodes: &[BundleNode], name: &str) -> Result<Companion> {
        nodes
            .iter()
            .find(|node| file_name_of(&node.path) == name)
            .map(|node| Companion {
                name: name.to_string(),
                location: CompanionLocation::BundleNode { offset: node.offset },
                len: node.size,
            })
            .ok_or_else(|| self.missing(name))
    }

    fn file_companion(&self, name: &str) -> Result<Companion> {
        for candidate in self.file_candidates(name) {
            let Ok(meta) = fs::metadata(&candidate) else {
                continue;
            };
            if meta.is_file() {
                return Ok(Companion {
                    name: name.to_string(),
                    location: CompanionLocation::File(candidate),
                    len: meta.len(),
                });
            }
        }
        Err(self.missing(name))
    }

    /// Where a referenced stream may live on disk, most specific first.
    ///
    /// Players reference the stream by its archive path; on disk it sits
    /// next to the container, sometimes renamed after the container itself.
    fn file_candidates(&self, name: &str) -> Vec<PathBuf> {
        let dir = self.container.parent().unwrap_or_else(|| Path::new(""));
        let mut candidates = vec![dir.join(name)];
        if let Some(file_name) = self.container.file_name() {
            let mut with_suffix = file_name.to_os_string();
            with_suffix.push(".resS");
            candidates.push(dir.join(with_suffix));
        }
        if let Some(stem) = self.container.file_stem() {
            let mut with_suffix = stem.to_os_string();
            with_suffix.push(".resS");
            let by_stem = dir.join(with_suffix);
            if !candidates.contains(&by_stem) {
                candidates.push(by_stem);
            }
        }
        candidates
    }

    fn missing(&self, name: &str) -> Error {
        let dir = self.container.parent().unwrap_or_else(|| Path::new(""));
        Error::MissingCompanion {
            container: self.container.to_path_buf(),
            companion: dir.join(name),
        }
    }
}
