//! Model chunks wrapping an NDP3 mesh.
//!
//! ```text
//! u16 field00, u16 field02, u8 flags[4]
//! current: u32 field08, u32 clump, u32 hit, u32 coord, u32 nud size
//! legacy:  u32 clump, u32 coord, u32 nud size
//! f32 bounds[6]                    when flags[1] & 0x04
//! NDP3 file
//! u16 material count, u32 material[count]
//! ```
//!
//! The layout is picked from the record id. If the NDP3 magic is not where
//! that layout puts it, the magic is located by scanning and the layout is
//! inferred from its offset. Offsets no known layout produces keep the bytes
//! before the mesh as they are.

use log::debug;
use xfbin_common::{BinaryReader, BinaryWriter};
use xfbin_nud::{Nud, NUD_MAGIC};

use super::{read_chunk_ids, write_chunk_ids, ChunkCodec, LEGACY_RECORD_ID};
use crate::error::{count_u16, count_u32};
use crate::{ChunkId, ChunkKind, DecodeScope, EncodeScope, Error, Result};

/// Flag bit in `flags[1]` marking a bounds block before the mesh.
pub const BOUNDS_FLAG: u8 = 0x04;

const PREFIX_SIZE: usize = 8;
const BOUNDS_SIZE: usize = 6 * 4;

/// The historical field layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelLayout {
    /// Clump and coord indices only.
    Legacy,
    #[default]
    Current,
    /// Unrecognized fields between the flags and the mesh, stored in
    /// [`Model::raw_fields`] and written back unchanged.
    Scanned,
}

impl ModelLayout {
    pub fn for_record_id(id: u16) -> Self {
        if id < LEGACY_RECORD_ID {
            Self::Legacy
        } else {
            Self::Current
        }
    }

    /// Size of the index words, including the mesh size word.
    fn fields_size(self) -> Option<usize> {
        match self {
            Self::Legacy => Some(3 * 4),
            Self::Current => Some(5 * 4),
            Self::Scanned => None,
        }
    }

    fn mesh_offset(self, bounds: bool) -> Option<usize> {
        let bounds_size = if bounds { BOUNDS_SIZE } else { 0 };
        self.fields_size().map(|size| PREFIX_SIZE + size + bounds_size)
    }

    /// Infer the layout from where the mesh starts.
    fn from_mesh_offset(offset: usize) -> Option<(Self, bool)> {
        [Self::Legacy, Self::Current]
            .into_iter()
            .flat_map(|layout| [(layout, false), (layout, true)])
            .find(|&(layout, bounds)| layout.mesh_offset(bounds) == Some(offset))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub field00: u16,
    pub field02: u16,
    pub flags: [u8; 4],
    pub layout: ModelLayout,
    /// Only stored in the current layout.
    pub field08: u32,
    pub clump: Option<ChunkId>,
    /// Only stored in the current layout.
    pub hit: Option<ChunkId>,
    pub coord: Option<ChunkId>,
    pub bounds: Option<[f32; 6]>,
    /// Bytes between the flags and the mesh in the scanned layout.
    pub raw_fields: Vec<u8>,
    pub nud: Nud,
    pub materials: Vec<ChunkId>,
}

impl Model {
    /// Check that every set field has a place in the layout.
    pub fn validate(&self) -> Result<()> {
        let unstored = match self.layout {
            ModelLayout::Current => None,
            ModelLayout::Legacy => self.hit.is_some().then_some("hit"),
            ModelLayout::Scanned => [
                ("clump", self.clump.is_some()),
                ("hit", self.hit.is_some()),
                ("coord", self.coord.is_some()),
                ("bounds", self.bounds.is_some()),
            ]
            .into_iter()
            .find_map(|(field, set)| set.then_some(field)),
        };
        match unstored {
            Some(field) => Err(Error::ModelLayoutField {
                layout: self.layout,
                field,
            }),
            None => Ok(()),
        }
    }
}

impl ChunkCodec for Model {
    const KIND: ChunkKind = ChunkKind::Model;

    fn decode(reader: &mut BinaryReader<'_>, scope: &DecodeScope<'_>) -> Result<Self> {
        let field00 = reader.read_u16()?;
        let field02 = reader.read_u16()?;
        let flags = reader.read_array::<4>()?;

        let mut layout = ModelLayout::for_record_id(scope.ids().id);
        let flag_bounds = flags[1] & BOUNDS_FLAG != 0;
        let mut has_bounds = flag_bounds;
        let mut mesh_start = layout.mesh_offset(has_bounds).unwrap_or(PREFIX_SIZE);

        let magic_at_expected = reader
            .data()
            .get(mesh_start..mesh_start + NUD_MAGIC.len())
            .is_some_and(|magic| magic == NUD_MAGIC);
        if !magic_at_expected {
            let found = reader
                .find(NUD_MAGIC)
                .ok_or_else(|| Error::invalid("model", "no NDP3 magic in payload"))?;
            mesh_start = found;
            (layout, has_bounds) =
                ModelLayout::from_mesh_offset(found).unwrap_or((ModelLayout::Scanned, false));
            debug!("NDP3 magic found by scan at {found:#x}, using {layout:?} layout");
            if layout != ModelLayout::Scanned && has_bounds != flag_bounds {
                debug!(
                    "Model bounds flag is {flag_bounds} but the mesh offset implies {has_bounds}; \
                     the flag will be rewritten on encode"
                );
            }
        }

        let mut model = Model {
            field00,
            field02,
            flags,
            layout,
            ..Default::default()
        };

        match layout {
            ModelLayout::Current => {
                model.field08 = reader.read_u32()?;
                model.clump = scope.optional_chunk(reader.read_u32()?)?;
                model.hit = scope.optional_chunk(reader.read_u32()?)?;
                model.coord = scope.optional_chunk(reader.read_u32()?)?;
                let _nud_size = reader.read_u32()?;
            }
            ModelLayout::Legacy => {
                model.clump = scope.optional_chunk(reader.read_u32()?)?;
                model.coord = scope.optional_chunk(reader.read_u32()?)?;
                let _nud_size = reader.read_u32()?;
            }
            ModelLayout::Scanned => {
                let len = mesh_start - reader.position();
                model.raw_fields = reader.read_bytes(len)?.to_vec();
            }
        }

        if has_bounds {
            model.bounds = Some(reader.read_f32_array()?);
        }

        // The NDP3 header's own file size is authoritative.
        let nud_size = reader.with_seek(reader.position() + 4, |r| r.read_u32())? as usize;
        model.nud = Nud::parse(reader.read_bytes(nud_size)?)?;

        let material_count = reader.read_u16()? as usize;
        model.materials = read_chunk_ids(reader, scope, material_count)?;

        Ok(model)
    }

    fn encode(&self, out: &mut BinaryWriter, scope: &mut EncodeScope<'_>) -> Result<()> {
        self.validate()?;
        let nud = self.nud.to_bytes()?;

        let mut flags = self.flags;
        if self.layout != ModelLayout::Scanned {
            if self.bounds.is_some() {
                flags[1] |= BOUNDS_FLAG;
            } else {
                flags[1] &= !BOUNDS_FLAG;
            }
        }

        out.write_u16(self.field00);
        out.write_u16(self.field02);
        out.write_bytes(&flags);

        match self.layout {
            ModelLayout::Current => {
                out.write_u32(self.field08);
                out.write_u32(scope.optional_index(self.clump)?);
                out.write_u32(scope.optional_index(self.hit)?);
                out.write_u32(scope.optional_index(self.coord)?);
                out.write_u32(count_u32("NUD size", nud.len())?);
            }
            ModelLayout::Legacy => {
                out.write_u32(scope.optional_index(self.clump)?);
                out.write_u32(scope.optional_index(self.coord)?);
                out.write_u32(count_u32("NUD size", nud.len())?);
            }
            ModelLayout::Scanned => out.write_bytes(&self.raw_fields),
        }

        if let Some(bounds) = &self.bounds {
            out.write_f32_slice(bounds);
        }
        out.write_bytes(&nud);

        out.write_u16(count_u16("material count", self.materials.len())?);
        write_chunk_ids(out, scope, &self.materials)?;
        Ok(())
    }
}
