//! Unity container formats
//!
//! Only the parts needed to enumerate objects and locate Texture2D pixel
//! data are implemented.

pub mod bundle;
pub mod common;
pub mod serialized;

pub use common::UnityVersion;
