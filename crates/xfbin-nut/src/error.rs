//! Error types for NTP3 texture handling.

use thiserror::Error;

/// Errors that can occur when reading or writing NTP3 textures.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] xfbin_common::Error),

    /// Invalid NTP3 magic.
    #[error("invalid NUT magic: expected 'NTP3', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Mipmap sizes add up to more than the texture data.
    #[error("mipmap sizes total {expected} bytes but texture data is {actual} bytes")]
    MipmapSizeMismatch { expected: usize, actual: usize },

    /// Mipmap count and the mipmap size table disagree.
    #[error("texture declares {count} mipmaps but lists {sizes} sizes")]
    MipmapCountMismatch { count: u8, sizes: usize },

    /// A value does not fit its on-disk field.
    #[error("{what} {value} exceeds the field limit")]
    Overflow { what: &'static str, value: usize },
}

/// Result type for NTP3 operations.
pub type Result<T> = std::result::Result<T, Error>;
