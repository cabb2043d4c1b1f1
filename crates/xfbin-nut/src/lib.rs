//! NTP3 texture container.
//!
//! Texture chunks embed a complete NTP3 file holding one or more textures.
//! Each texture stores either a mipmap chain or six cubemap faces, never
//! both, followed by its pixel data inline.

mod error;
mod nut;
mod texture;

pub use error::{Error, Result};
pub use nut::Nut;
pub use texture::{NutTexture, PixelFormat, CUBEMAP_FACES, CUBEMAP_FLAG, DEFAULT_EXT_BLOCK};

/// NTP3 file magic bytes.
pub const NUT_MAGIC: &[u8; 4] = b"NTP3";
