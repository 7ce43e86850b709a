//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! `UnityFS` asset bundle reader/writer
//!
//! A bundle is a header, a block-info table and a sequence of compressed
//! storage blocks. Concatenated, the blocks form one data stream that holds
//! the bundle's nodes (serialized files and `.resS` resources).

mod reader;
mod types;
mod writer;

pub use reader::{is_bundle, read_bundle};
pub use types::*;
pub use writer::{RebuiltBundle, compress, rebuild_bundle, write_block_info};

/// Bundle signature, including the terminating NUL
pub const SIGNATURE: &[u8] = b"UnityFS\0";

/// Minimum supported archive version
pub const MIN_VERSION: u32 = 6;

/// Maximum supported archive version
pub const MAX_VERSION: u32 = 8;
