//! Error types for `UniTex`

use std::path::PathBuf;

use thiserror::Error;

use crate::texture::TextureFormat;

/// The error type for `UniTex` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A read ran past the end of a buffer.
    #[error("unexpected end of data at offset {offset} (wanted {wanted} bytes, {available} available)")]
    UnexpectedEof {
        /// Position of the failed read.
        offset: usize,
        /// Bytes requested.
        wanted: usize,
        /// Bytes remaining.
        available: usize,
    },

    /// A structural value inside a buffer is impossible.
    #[error("corrupt data at offset {offset}: {message}")]
    Corrupt {
        /// Position of the offending value.
        offset: usize,
        /// What was wrong with it.
        message: String,
    },

    // ==================== Container Errors ====================
    /// The file is not a recognized Unity container, or it is corrupt.
    #[error("{}: not a valid container: {reason}", path.display())]
    InvalidFormat {
        /// The container path.
        path: PathBuf,
        /// Description of what is invalid.
        reason: String,
    },

    /// The serialized-file or bundle version is outside the supported range.
    #[error("unsupported {kind} version {version}")]
    UnsupportedContainerVersion {
        /// Which structure carried the version.
        kind: &'static str,
        /// The version number found in the file.
        version: u32,
    },

    /// A bundle block or info table uses a compression method we cannot read.
    #[error("unsupported bundle compression: {method}")]
    UnsupportedCompression {
        /// The compression method name or id.
        method: String,
    },

    /// An external data stream referenced by the container is absent.
    #[error("{}: companion stream '{}' is missing", container.display(), companion.display())]
    MissingCompanion {
        /// The container that references the stream.
        container: PathBuf,
        /// The expected companion path.
        companion: PathBuf,
    },

    /// LZ4 block decompression failed.
    #[error("LZ4 decompression failed: {0}")]
    Lz4(#[from] lz4_flex::block::DecompressError),

    // ==================== Texture Errors ====================
    /// No Texture2D with this identifier or name exists in the container.
    #[error("texture not found: {0}")]
    TextureNotFound(String),

    /// The pixel format has no decoder or encoder available.
    #[error("texture '{texture}': cannot {operation} {format} data")]
    UnsupportedFormat {
        /// Display name of the texture.
        texture: String,
        /// The declared pixel format.
        format: TextureFormat,
        /// Either `decode` or `encode`.
        operation: &'static str,
    },

    /// A raster image cannot be represented in the target format.
    #[error("texture '{texture}': encode failed: {message}")]
    Encode {
        /// Display name of the texture.
        texture: String,
        /// What prevented encoding.
        message: String,
    },

    /// The encoded payload does not fit the record's byte range.
    #[error("texture '{texture}': payload is {actual} bytes, record holds {expected}")]
    SizeMismatch {
        /// Display name of the texture.
        texture: String,
        /// Length of the record's byte range.
        expected: usize,
        /// Length of the supplied payload.
        actual: usize,
    },

    /// The stored pixel data is shorter than the format requires.
    #[error("texture '{texture}': pixel data truncated ({actual} of {expected} bytes)")]
    TruncatedPixelData {
        /// Display name of the texture.
        texture: String,
        /// Bytes needed for the top mip level.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// A zero width or height was requested.
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Failed to load or save an image file.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    // ==================== Backup Errors ====================
    /// Restore was requested for a path that was never backed up.
    #[error("no backup exists for {}", path.display())]
    NoBackup {
        /// The container path.
        path: PathBuf,
    },

    /// The backup location exists but cannot hold backups.
    #[error("invalid backup directory {}: {reason}", path.display())]
    InvalidBackupDirectory {
        /// The configured directory.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    // ==================== Serialization Errors ====================
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file could not be parsed or written.
    #[error("settings error: {message}")]
    Settings {
        /// The underlying TOML error message.
        message: String,
    },
}

impl Error {
    /// Create an [`Error::InvalidFormat`] for a container path.
    pub fn invalid_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this failure is scoped to a single texture record.
    ///
    /// Record-level failures leave the rest of the container usable; all
    /// other errors abort the whole operation.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat { .. }
                | Self::Encode { .. }
                | Self::TruncatedPixelData { .. }
                | Self::SizeMismatch { .. }
                | Self::TextureNotFound(_)
        )
    }
}

/// Result type alias for `UniTex` operations.
pub type Result<T> = std::result::Result<T, Error>;
