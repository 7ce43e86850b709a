//! Path utilities

use std::path::{Path, PathBuf};

/// Normalize path separators to forward slashes
pub fn normalize_path<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

/// Absolute, symlink-resolved form of `path`, used as a stable key.
///
/// Falls back to joining with the current directory when the path does not
/// exist yet.
pub fn canonical_key<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    path.canonicalize().unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    })
}

/// Last component of a `/`-separated or OS path, as a string.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
