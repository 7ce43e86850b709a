//! Discovery of container files in a game installation

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extensions of container files.
const CONTAINER_EXTENSIONS: &[&str] = &["assets", "bundle", "unity3d"];

/// Extensionless serialized files a player build ships (`level0`, `sharedassets3`).
const NUMBERED_PREFIXES: &[&str] = &["level", "sharedassets"];

/// Find all container files under a directory, sorted.
///
/// Matches `*.assets`, `*.bundle`, `*.unity3d` and the extensionless
/// `level<N>` / `sharedassets<N>` files; `.resS` streams are not listed.
pub fn find_containers<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let mut containers: Vec<_> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.path().is_file() && is_container_path(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();

    containers.sort();
    containers
}

/// Whether a path looks like a container by name alone.
pub fn is_container_path(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        return CONTAINER_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known));
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    NUMBERED_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
    })
}
