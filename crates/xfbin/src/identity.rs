//! Chunk identities and type names.

use std::fmt;

/// Prefix shared by every NUCC chunk type name.
pub const TYPE_PREFIX: &str = "nucc";

/// The (type, path, name) triple that identifies a chunk.
///
/// Two chunks with equal identities are the same chunk, even when they are
/// listed in different pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChunkIdentity {
    #[cfg_attr(feature = "serde", serde(rename = "Name"))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "Type"))]
    pub type_name: String,
    #[cfg_attr(feature = "serde", serde(rename = "Path"))]
    pub path: String,
}

impl ChunkIdentity {
    pub fn new(
        type_name: impl Into<String>,
        path: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            path: path.into(),
        }
    }

    /// The leading record of every page.
    pub fn null() -> Self {
        Self::new(ChunkKind::Null.type_name(), "", "")
    }

    /// The record that closes a page.
    pub fn page() -> Self {
        Self::new(ChunkKind::Page.type_name(), "", "Page0")
    }

    /// Listed last in every page's index slice, never written as a record.
    pub fn index() -> Self {
        Self::new(ChunkKind::Index.type_name(), "", "index")
    }

    /// The type name with the `nuccChunk` prefix removed.
    pub fn short_type_name(&self) -> &str {
        self.type_name
            .strip_prefix("nuccChunk")
            .unwrap_or(&self.type_name)
    }
}

impl fmt::Display for ChunkIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.type_name)
    }
}

/// Chunk types known to the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChunkKind {
    Null,
    Page,
    Index,
    Texture,
    Model,
    ModelHit,
    Material,
    Clump,
    Coord,
    Dynamics,
    Anm,
    AnmStrm,
    AnmStrmFrame,
    Billboard,
    Trail,
    Camera,
    Particle,
    Binary,
    /// A type name the registry does not know.
    Unknown,
}

impl ChunkKind {
    pub const ALL: [ChunkKind; 18] = [
        Self::Null,
        Self::Page,
        Self::Index,
        Self::Texture,
        Self::Model,
        Self::ModelHit,
        Self::Material,
        Self::Clump,
        Self::Coord,
        Self::Dynamics,
        Self::Anm,
        Self::AnmStrm,
        Self::AnmStrmFrame,
        Self::Billboard,
        Self::Trail,
        Self::Camera,
        Self::Particle,
        Self::Binary,
    ];

    /// The variant tag, which is the type name without its leading `nucc`.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Null => "ChunkNull",
            Self::Page => "ChunkPage",
            Self::Index => "ChunkIndex",
            Self::Texture => "ChunkTexture",
            Self::Model => "ChunkModel",
            Self::ModelHit => "ChunkModelHit",
            Self::Material => "ChunkMaterial",
            Self::Clump => "ChunkClump",
            Self::Coord => "ChunkCoord",
            Self::Dynamics => "ChunkDynamics",
            Self::Anm => "ChunkAnm",
            Self::AnmStrm => "ChunkAnmStrm",
            Self::AnmStrmFrame => "ChunkAnmStrmFrame",
            Self::Billboard => "ChunkBillboard",
            Self::Trail => "ChunkTrail",
            Self::Camera => "ChunkCamera",
            Self::Particle => "ChunkParticle",
            Self::Binary => "ChunkBinary",
            Self::Unknown => "ChunkUnknown",
        }
    }

    /// The on-disk type name, e.g. `nuccChunkClump`.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Null => "nuccChunkNull",
            Self::Page => "nuccChunkPage",
            Self::Index => "nuccChunkIndex",
            Self::Texture => "nuccChunkTexture",
            Self::Model => "nuccChunkModel",
            Self::ModelHit => "nuccChunkModelHit",
            Self::Material => "nuccChunkMaterial",
            Self::Clump => "nuccChunkClump",
            Self::Coord => "nuccChunkCoord",
            Self::Dynamics => "nuccChunkDynamics",
            Self::Anm => "nuccChunkAnm",
            Self::AnmStrm => "nuccChunkAnmStrm",
            Self::AnmStrmFrame => "nuccChunkAnmStrmFrame",
            Self::Billboard => "nuccChunkBillboard",
            Self::Trail => "nuccChunkTrail",
            Self::Camera => "nuccChunkCamera",
            Self::Particle => "nuccChunkParticle",
            Self::Binary => "nuccChunkBinary",
            Self::Unknown => "nuccChunkUnknown",
        }
    }

    /// Look up a known type name. Unknown names yield `None`.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let tag = name.strip_prefix(TYPE_PREFIX)?;
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Null, Page and Index are page framing, not content.
    pub fn is_marker(self) -> bool {
        matches!(self, Self::Null | Self::Page | Self::Index)
    }

    /// Kinds stored as raw bytes, which may embed page-local indices.
    pub fn is_passthrough(self) -> bool {
        matches!(
            self,
            Self::Billboard | Self::Trail | Self::Particle | Self::Binary | Self::Unknown
        )
    }

    /// File extension used when extracting the chunk's data.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Texture => ".nut",
            Self::Model => ".nud",
            Self::Dynamics => ".dynamics",
            Self::Anm => ".anm",
            Self::Clump => ".clump",
            Self::Material => ".material",
            Self::Coord => ".coord",
            Self::Billboard => ".billboard",
            Self::Trail => ".trail",
            Self::Camera => ".cam",
            Self::Particle => ".particle",
            _ => ".bin",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
