//! Utility functions

pub mod atomic;
pub mod binary;
pub mod path;

pub use atomic::{StagedFile, copy_atomic, write_atomic};
pub use binary::BinaryReader;
pub use path::{canonical_key, file_name_of, normalize_path};
