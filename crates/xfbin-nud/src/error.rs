//! Error types for NDP3 mesh handling.

use thiserror::Error;

/// Errors that can occur when reading or writing NDP3 meshes.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] xfbin_common::Error),

    /// Invalid NDP3 magic.
    #[error("invalid NUD magic: expected 'NDP3', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Low nibble of a mesh's vertex size byte is not a known layout.
    #[error("unsupported vertex type {0:#x}")]
    UnsupportedVertexType(u8),

    /// High nibble of a mesh's vertex size byte is not a known layout.
    #[error("unsupported bone type {0:#x}")]
    UnsupportedBoneType(u8),

    /// Bone-weighted meshes store colors in one of three encodings.
    #[error("unsupported UV/color type {0:#x}")]
    UnsupportedUvType(u8),

    /// A count does not fit its on-disk field.
    #[error("{what} count {count} exceeds the field limit of {max}")]
    CountOverflow {
        what: &'static str,
        count: usize,
        max: usize,
    },

    /// A mesh carries more material records than the four slots allow.
    #[error("mesh has {0} materials, at most 4 are supported")]
    TooManyMaterials(usize),

    /// The declared file size disagrees with the buffer.
    #[error("NUD declares {declared} bytes but {available} are available")]
    SizeMismatch { declared: usize, available: usize },
}

/// Result type for NDP3 operations.
pub type Result<T> = std::result::Result<T, Error>;
