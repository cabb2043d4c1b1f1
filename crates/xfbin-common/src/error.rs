//! Error types for xfbin-common.

use thiserror::Error;

/// Common error type for binary reading.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error(
        "unexpected end of buffer at offset {offset:#x}: needed {needed} bytes but only {available} available"
    )]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Seek target lies outside the buffer.
    #[error("seek to {position:#x} is outside the buffer (length {len:#x})")]
    SeekOutOfBounds { position: usize, len: usize },

    /// Invalid magic bytes encountered.
    #[error("invalid magic at offset {offset:#x}: expected {expected:?}, got {actual:?}")]
    InvalidMagic {
        offset: usize,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    /// UTF-8 decoding error.
    #[error("string at offset {offset:#x} is not valid UTF-8: {source}")]
    Utf8 {
        offset: usize,
        source: std::str::Utf8Error,
    },

    /// Missing null terminator in string.
    #[error("string at offset {offset:#x} is missing its null terminator")]
    MissingNullTerminator { offset: usize },
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
