//! Typed chunk payloads.
//!
//! Each type implements [`ChunkCodec`]. Payload fields that point at other
//! chunks are stored as [`ChunkId`](crate::ChunkId) handles and translated
//! to page-local indices through the page scope.

mod anm;
mod anm_strm;
mod camera;
mod clump;
mod coord;
mod dynamics;
mod material;
mod model;
mod model_hit;
mod texture;

pub use anm::{
    Anm, AnmClump, AnmCoordParent, AnmCurve, AnmEntry, AnmEntryFormat, CurveFormat, CurveKeys,
    DataPath, Keyframe, Track,
};
pub use anm_strm::{AnmStrm, AnmStrmClump, AnmStrmFrame, FrameInfo, StrmEntry, StrmEntryBody};
pub use camera::Camera;
pub use clump::{Clump, ClumpModelGroup, CoordNode};
pub use coord::Coord;
pub use dynamics::{CollisionSphere, Dynamics, DynamicsShape, SpringGroup};
pub use material::{float_count, Material, TextureGroup};
pub use model::{Model, ModelLayout};
pub use model_hit::{HitSection, ModelHit};
pub use texture::Texture;

use xfbin_common::{BinaryReader, BinaryWriter};

use crate::{ChunkData, ChunkKind, DecodeScope, EncodeScope, PageMarker, Result};

/// Record id below which chunk types with two layouts use the older one.
pub const LEGACY_RECORD_ID: u16 = 0x6F;

/// A payload layout for one chunk type.
pub trait ChunkCodec: Sized {
    const KIND: ChunkKind;

    /// Decode a payload. The reader covers exactly the record's payload.
    fn decode(reader: &mut BinaryReader<'_>, scope: &DecodeScope<'_>) -> Result<Self>;

    /// Encode a payload, assigning page-local indices as needed.
    fn encode(&self, out: &mut BinaryWriter, scope: &mut EncodeScope<'_>) -> Result<()>;
}

fn decode_with<T: ChunkCodec>(payload: &[u8], scope: &DecodeScope<'_>) -> Result<T> {
    let mut reader = BinaryReader::new(payload);
    T::decode(&mut reader, scope)
}

/// Decode a record payload for the given kind.
pub fn decode_payload(kind: ChunkKind, payload: &[u8], scope: &DecodeScope<'_>) -> Result<ChunkData> {
    Ok(match kind {
        ChunkKind::Null => ChunkData::Null,
        ChunkKind::Page => {
            let mut reader = BinaryReader::new(payload);
            ChunkData::Page(PageMarker::read(&mut reader)?)
        }
        ChunkKind::Texture => ChunkData::Texture(decode_with(payload, scope)?),
        ChunkKind::Model => ChunkData::Model(decode_with(payload, scope)?),
        ChunkKind::ModelHit => ChunkData::ModelHit(decode_with(payload, scope)?),
        ChunkKind::Material => ChunkData::Material(decode_with(payload, scope)?),
        ChunkKind::Clump => ChunkData::Clump(decode_with(payload, scope)?),
        ChunkKind::Coord => ChunkData::Coord(decode_with(payload, scope)?),
        ChunkKind::Dynamics => ChunkData::Dynamics(decode_with(payload, scope)?),
        ChunkKind::Anm => ChunkData::Anm(decode_with(payload, scope)?),
        ChunkKind::AnmStrm => ChunkData::AnmStrm(decode_with(payload, scope)?),
        ChunkKind::AnmStrmFrame => ChunkData::AnmStrmFrame(decode_with(payload, scope)?),
        ChunkKind::Camera => ChunkData::Camera(decode_with(payload, scope)?),
        ChunkKind::Billboard => ChunkData::Billboard(payload.to_vec()),
        ChunkKind::Trail => ChunkData::Trail(payload.to_vec()),
        ChunkKind::Particle => ChunkData::Particle(payload.to_vec()),
        ChunkKind::Binary => ChunkData::Binary(payload.to_vec()),
        ChunkKind::Index | ChunkKind::Unknown => ChunkData::Opaque(payload.to_vec()),
    })
}

/// Encode a payload. Markers encode to their fixed bytes.
pub fn encode_payload(data: &ChunkData, scope: &mut EncodeScope<'_>) -> Result<Vec<u8>> {
    let mut out = BinaryWriter::new();
    match data {
        ChunkData::Null => {}
        ChunkData::Page(marker) => marker.write(&mut out),
        ChunkData::Texture(chunk) => chunk.encode(&mut out, scope)?,
        ChunkData::Model(chunk) => chunk.encode(&mut out, scope)?,
        ChunkData::ModelHit(chunk) => chunk.encode(&mut out, scope)?,
        ChunkData::Material(chunk) => chunk.encode(&mut out, scope)?,
        ChunkData::Clump(chunk) => chunk.encode(&mut out, scope)?,
        ChunkData::Coord(chunk) => chunk.encode(&mut out, scope)?,
        ChunkData::Dynamics(chunk) => chunk.encode(&mut out, scope)?,
        ChunkData::Anm(chunk) => chunk.encode(&mut out, scope)?,
        ChunkData::AnmStrm(chunk) => chunk.encode(&mut out, scope)?,
        ChunkData::AnmStrmFrame(chunk) => chunk.encode(&mut out, scope)?,
        ChunkData::Camera(chunk) => chunk.encode(&mut out, scope)?,
        ChunkData::Billboard(bytes)
        | ChunkData::Trail(bytes)
        | ChunkData::Particle(bytes)
        | ChunkData::Binary(bytes)
        | ChunkData::Opaque(bytes) => out.write_bytes(bytes),
    }
    Ok(out.into_bytes())
}

/// Read `count` page-local indices and resolve them.
fn read_chunk_ids(
    reader: &mut BinaryReader<'_>,
    scope: &DecodeScope<'_>,
    count: usize,
) -> Result<Vec<crate::ChunkId>> {
    reader
        .read_u32_vec(count)?
        .into_iter()
        .map(|index| scope.chunk(index))
        .collect()
}

/// Write the page-local indices of `ids`.
fn write_chunk_ids(
    out: &mut BinaryWriter,
    scope: &mut EncodeScope<'_>,
    ids: &[crate::ChunkId],
) -> Result<()> {
    for &id in ids {
        out.write_u32(scope.index_of(id)?);
    }
    Ok(())
}
