//! Chunk storage.
//!
//! The container owns every chunk in a [`ChunkArena`]. Pages and typed
//! payloads refer to chunks through [`ChunkId`] handles, so a chunk listed in
//! several pages, or referenced by several other chunks, is stored once.

use std::collections::HashMap;
use std::fmt;

use xfbin_common::{BinaryReader, BinaryWriter};

use crate::chunks::{
    Anm, AnmStrm, AnmStrmFrame, Camera, Clump, Coord, Dynamics, Material, Model, ModelHit,
    Texture,
};
use crate::{ChunkIdentity, ChunkKind, Error, Result};

/// Handle to a chunk stored in a [`ChunkArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub(crate) usize);

impl ChunkId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two legacy words stored in every record header.
///
/// The first one doubles as a format version for chunk types that changed
/// layout between games.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordIds {
    pub id: u16,
    pub unk: u16,
}

impl Default for RecordIds {
    fn default() -> Self {
        Self { id: 0x79, unk: 0 }
    }
}

/// Payload of the record that closes a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMarker {
    /// Number of index slots the page consumed.
    pub page_size: u32,
    /// Number of references the page consumed.
    pub reference_size: u32,
}

impl PageMarker {
    pub const SIZE: usize = 8;

    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            page_size: reader.read_u32()?,
            reference_size: reader.read_u32()?,
        })
    }

    pub fn write(&self, out: &mut BinaryWriter) {
        out.write_u32(self.page_size);
        out.write_u32(self.reference_size);
    }
}

/// Decoded chunk payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkData {
    Null,
    Page(PageMarker),
    Texture(Texture),
    Model(Model),
    ModelHit(ModelHit),
    Material(Material),
    Clump(Clump),
    Coord(Coord),
    Dynamics(Dynamics),
    Anm(Anm),
    AnmStrm(AnmStrm),
    AnmStrmFrame(AnmStrmFrame),
    Camera(Camera),
    Billboard(Vec<u8>),
    Trail(Vec<u8>),
    Particle(Vec<u8>),
    Binary(Vec<u8>),
    /// Raw payload of an unknown type, or of a chunk whose typed decode failed.
    Opaque(Vec<u8>),
}

impl ChunkData {
    pub fn kind(&self) -> ChunkKind {
        match self {
            Self::Null => ChunkKind::Null,
            Self::Page(_) => ChunkKind::Page,
            Self::Texture(_) => ChunkKind::Texture,
            Self::Model(_) => ChunkKind::Model,
            Self::ModelHit(_) => ChunkKind::ModelHit,
            Self::Material(_) => ChunkKind::Material,
            Self::Clump(_) => ChunkKind::Clump,
            Self::Coord(_) => ChunkKind::Coord,
            Self::Dynamics(_) => ChunkKind::Dynamics,
            Self::Anm(_) => ChunkKind::Anm,
            Self::AnmStrm(_) => ChunkKind::AnmStrm,
            Self::AnmStrmFrame(_) => ChunkKind::AnmStrmFrame,
            Self::Camera(_) => ChunkKind::Camera,
            Self::Billboard(_) => ChunkKind::Billboard,
            Self::Trail(_) => ChunkKind::Trail,
            Self::Particle(_) => ChunkKind::Particle,
            Self::Binary(_) => ChunkKind::Binary,
            Self::Opaque(_) => ChunkKind::Unknown,
        }
    }

    /// Raw bytes of a pass-through payload.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Billboard(bytes)
            | Self::Trail(bytes)
            | Self::Particle(bytes)
            | Self::Binary(bytes)
            | Self::Opaque(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Pass-through payloads may embed page-local indices the codec cannot see.
    pub fn is_passthrough(&self) -> bool {
        self.raw_bytes().is_some()
    }
}

/// One chunk: its identity and, once decoded or assigned, its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub identity: ChunkIdentity,
    pub data: Option<ChunkData>,
    pub ids: RecordIds,
}

impl Chunk {
    pub fn new(identity: ChunkIdentity) -> Self {
        Self {
            identity,
            data: None,
            ids: RecordIds::default(),
        }
    }

    /// Kind of the decoded data, or of the type name when there is none.
    pub fn kind(&self) -> ChunkKind {
        match &self.data {
            Some(ChunkData::Opaque(_)) | None => {
                ChunkKind::from_type_name(&self.identity.type_name).unwrap_or(ChunkKind::Unknown)
            }
            Some(data) => data.kind(),
        }
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn is_passthrough(&self) -> bool {
        self.data.as_ref().is_some_and(ChunkData::is_passthrough)
    }
}

/// A named pointer from a page to a chunk, usually one in another page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReference {
    pub name: String,
    pub chunk: ChunkId,
}

impl ChunkReference {
    pub fn new(name: impl Into<String>, chunk: ChunkId) -> Self {
        Self {
            name: name.into(),
            chunk,
        }
    }
}

/// Owner of every chunk in a container, deduplicated by identity.
#[derive(Debug, Clone, Default)]
pub struct ChunkArena {
    chunks: Vec<Chunk>,
    lookup: HashMap<ChunkIdentity, ChunkId>,
}

impl ChunkArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the chunk with this identity, creating an empty one if needed.
    pub fn insert(&mut self, identity: ChunkIdentity) -> ChunkId {
        if let Some(&id) = self.lookup.get(&identity) {
            return id;
        }
        let id = ChunkId(self.chunks.len());
        self.lookup.insert(identity.clone(), id);
        self.chunks.push(Chunk::new(identity));
        id
    }

    /// Insert or replace the payload of the chunk with this identity.
    pub fn insert_with_data(&mut self, identity: ChunkIdentity, data: ChunkData) -> ChunkId {
        let id = self.insert(identity);
        self.chunks[id.0].data = Some(data);
        id
    }

    pub fn find(&self, identity: &ChunkIdentity) -> Option<ChunkId> {
        self.lookup.get(identity).copied()
    }

    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(id.0)
    }

    pub fn get_mut(&mut self, id: ChunkId) -> Option<&mut Chunk> {
        self.chunks.get_mut(id.0)
    }

    /// Like [`get`](Self::get), failing with [`Error::DanglingChunk`].
    pub fn chunk(&self, id: ChunkId) -> Result<&Chunk> {
        self.get(id).ok_or(Error::DanglingChunk(id.0))
    }

    pub fn contains(&self, id: ChunkId) -> bool {
        id.0 < self.chunks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChunkId, &Chunk)> {
        self.chunks.iter().enumerate().map(|(i, c)| (ChunkId(i), c))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.lookup.clear();
    }
}
