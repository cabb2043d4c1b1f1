//! Error types for XFBIN containers.

use thiserror::Error;

/// Errors that can occur when decoding or encoding an XFBIN container.
///
/// Variants fall into four groups. Format errors (bad magic, truncated data)
/// and reference resolution errors (indices outside the chunk table) abort a
/// decode. Chunk data errors are raised by the per-type codecs and are
/// recovered by the container, which keeps the payload as raw bytes; see
/// [`Error::is_recoverable`]. Encode invariant errors are raised before any
/// output is produced.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error (truncated data, bad seek, invalid string).
    #[error("{0}")]
    Common(#[from] xfbin_common::Error),

    /// The file does not start with `NUCC`.
    #[error("invalid XFBIN magic: expected 'NUCC', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// The file starts with `CPK `, the magic of an unextracted archive.
    #[error("file starts with 'CPK ' and is possibly CPK compressed; extract it first")]
    CpkCompressed,

    /// A page ran to the end of the file without a page marker.
    #[error("page starting at offset {offset:#x} has no nuccChunkPage record")]
    MissingPageMarker { offset: usize },

    /// A string pool index is past the end of its pool.
    #[error("{pool} pool index {index} out of bounds (pool size: {len})")]
    StringIndexOutOfBounds {
        pool: &'static str,
        index: u32,
        len: usize,
    },

    /// A reference or index entry points past the chunk map array.
    #[error("chunk map index {index} out of bounds (map count: {len})")]
    ChunkMapIndexOutOfBounds { index: u32, len: usize },

    /// A page-local chunk index is past the end of the page's index slice.
    #[error("page-local chunk index {index} out of bounds (page size: {len})")]
    ChunkIndexOutOfBounds { index: u32, len: usize },

    /// A page reference index is past the end of the page's reference slice.
    #[error("reference index {index} out of bounds (page references: {len})")]
    ReferenceIndexOutOfBounds { index: u32, len: usize },

    /// A typed chunk payload could not be parsed.
    #[error("invalid {chunk} data: {reason}")]
    InvalidChunkData { chunk: &'static str, reason: String },

    /// An animation curve uses a format code with no known value layout.
    #[error("unsupported animation curve format {0:#x}")]
    UnsupportedCurveFormat(u16),

    /// Embedded NDP3 mesh error.
    #[error("NUD error: {0}")]
    Nud(#[from] xfbin_nud::Error),

    /// Embedded NTP3 texture error.
    #[error("NUT error: {0}")]
    Nut(#[from] xfbin_nut::Error),

    /// A chunk handle does not belong to the container being encoded.
    #[error("chunk handle {0} does not exist in this container")]
    DanglingChunk(usize),

    /// A page lists a chunk that has no decoded data to write.
    #[error("chunk '{name}' ({type_name}) has no data")]
    MissingChunkData { name: String, type_name: String },

    /// A material's float list disagrees with its format byte.
    #[error("material format {format:#04x} declares {expected} floats but {actual} are present")]
    MaterialFloatCount {
        format: u8,
        expected: usize,
        actual: usize,
    },

    /// A model field is set that its layout has no room for.
    #[error("model layout {layout:?} cannot store {field}")]
    ModelLayoutField {
        layout: crate::chunks::ModelLayout,
        field: &'static str,
    },

    /// A clump's coord nodes do not form a forest.
    #[error("invalid clump coord tree: {0}")]
    InvalidClumpTree(String),

    /// A count or size does not fit its on-disk field.
    #[error("{what} {value} does not fit its on-disk field")]
    Overflow { what: &'static str, value: usize },
}

impl Error {
    /// Whether a payload decode failure can be recovered by keeping the raw bytes.
    ///
    /// Only meaningful for errors raised while decoding one chunk's payload.
    /// Index resolution failures point at a corrupt chunk table and are never
    /// recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Common(_)
                | Self::InvalidChunkData { .. }
                | Self::UnsupportedCurveFormat(_)
                | Self::Nud(_)
                | Self::Nut(_)
                | Self::InvalidClumpTree(_)
        )
    }

    pub(crate) fn invalid(chunk: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidChunkData {
            chunk,
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(what: &'static str, value: usize) -> Self {
        Self::Overflow { what, value }
    }
}

/// Result type for XFBIN operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Narrow a length to a `u16` count field.
pub(crate) fn count_u16(what: &'static str, value: usize) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::overflow(what, value))
}

/// Narrow a length to a `u32` count or size field.
pub(crate) fn count_u32(what: &'static str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::overflow(what, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::invalid("clump", "bad").is_recoverable());
        assert!(Error::UnsupportedCurveFormat(0x99).is_recoverable());
        assert!(!Error::ChunkIndexOutOfBounds { index: 4, len: 2 }.is_recoverable());
        assert!(!Error::CpkCompressed.is_recoverable());
        assert!(!Error::DanglingChunk(3).is_recoverable());
    }

    #[test]
    fn test_count_narrowing() {
        assert_eq!(count_u16("bones", 12).unwrap(), 12);
        assert!(matches!(
            count_u16("bones", 70_000),
            Err(Error::Overflow { what: "bones", value: 70_000 })
        ));
    }
}
