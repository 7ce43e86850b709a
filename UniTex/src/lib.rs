//! # UniTex
//!
//! A pure-Rust library for finding, exporting and replacing `Texture2D`
//! objects inside Unity player data.
//!
//! ## Supported Containers
//!
//! - **Serialized files** - `.assets`, `level<N>` and `sharedassets<N>` files
//!   (format versions 9 to 22), with `.resS` companion streams
//! - **UnityFS bundles** - `.bundle` / `.unity3d` archives with uncompressed
//!   or LZ4/LZ4HC blocks
//!
//! ## Supported Pixel Formats
//!
//! Uncompressed 8-bit and packed 16-bit layouts (Alpha8, R8, RG16, RGB24,
//! RGBA32, ARGB32, BGRA32, RGB565, RGBA4444, ARGB4444) can be decoded and
//! encoded. DXT1 and DXT5 can be decoded and encoded; BC4, BC5 and BC7 are
//! decode-only. Further block codecs can be plugged in through
//! [`codec::CodecRegistry`].
//!
//! ## Quick Start
//!
//! ### Replacing a Texture
//!
//! ```no_run
//! use unitex::prelude::*;
//!
//! let store = BackupStore::open("backups")?;
//! let writer = PatchWriter::with_backups(&store);
//! let registry = CodecRegistry::default();
//!
//! let mut container = Container::open("sharedassets0.assets")?;
//! let outcome = replace_texture(&mut container, "Logo", "logo.png", &writer, &registry)?;
//! println!("Replaced {} ({} bytes)", outcome.name, outcome.bytes);
//!
//! // Put the pristine file back
//! store.restore("sharedassets0.assets")?;
//! # Ok::<(), unitex::Error>(())
//! ```
//!
//! ### Exporting Textures
//!
//! ```no_run
//! use unitex::prelude::*;
//!
//! let container = Container::open("ui.bundle")?;
//! let registry = CodecRegistry::default();
//! for record in list_textures(&container) {
//!     println!("{} {}x{} {}", record.id, record.width, record.height, record.format);
//! }
//! let summary = export_all(&container, "out".as_ref(), ExportFormat::Png, false, &registry, |_| {})?;
//! println!("{} exported, {} failed", summary.success_count, summary.fail_count);
//! # Ok::<(), unitex::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `unitex` command-line binary

pub mod backup;
pub mod codec;
pub mod config;
pub mod conform;
pub mod container;
pub mod discovery;
pub mod error;
pub mod export;
pub mod formats;
pub mod patch;
pub mod pipeline;
pub mod texture;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};

    pub use crate::backup::{BackupEntry, BackupState, BackupStore};
    pub use crate::codec::{BlockCodec, ChannelLayout, CodecRegistry, RasterImage};
    pub use crate::config::Settings;
    pub use crate::conform::conform;
    pub use crate::container::{Container, ContainerKind, ContainerObject, ObjectKind};
    pub use crate::discovery::find_containers;
    pub use crate::export::{ExportFormat, export, export_png, export_tga};
    pub use crate::patch::{PatchWriter, StagedPatch};
    pub use crate::pipeline::{
        ExportAllResult, ExportProgress, ReplaceOutcome, export_all, export_texture,
        replace_texture, replace_with_image, restore_texture,
    };
    pub use crate::texture::{
        TextureFormat, TextureId, TextureRecord, find_texture, find_texture_by_name,
        list_textures, resolve,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
