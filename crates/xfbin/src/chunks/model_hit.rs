//! Collision meshes.

use xfbin_common::{BinaryReader, BinaryWriter};

use super::ChunkCodec;
use crate::error::count_u32;
use crate::{ChunkKind, DecodeScope, EncodeScope, Result};

pub type Triangle = [[f32; 3]; 3];

/// One collision mesh section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitSection {
    pub unk_count: u8,
    pub flags: [u8; 3],
    pub triangles: Vec<Triangle>,
}

/// Triangle soup used for model collision.
///
/// The total vertex size in the header is recomputed on write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelHit {
    pub sections: Vec<HitSection>,
}

impl ModelHit {
    pub fn triangle_count(&self) -> usize {
        self.sections.iter().map(|s| s.triangles.len()).sum()
    }
}

impl ChunkCodec for ModelHit {
    const KIND: ChunkKind = ChunkKind::ModelHit;

    fn decode(reader: &mut BinaryReader<'_>, _scope: &DecodeScope<'_>) -> Result<Self> {
        let section_count = reader.read_u32()? as usize;
        let _total_vertex_size = reader.read_u32()?;

        // Each section needs at least its 8-byte header.
        if section_count > reader.remaining() / 8 {
            return Err(crate::Error::invalid(
                "model hit",
                format!("{section_count} sections do not fit in {} bytes", reader.remaining()),
            ));
        }

        let mut sections = Vec::with_capacity(section_count);
        for _ in 0..section_count {
            let triangle_count = reader.read_u32()? as usize;
            let unk_count = reader.read_u8()?;
            let flags = reader.read_array::<3>()?;
            let values = reader.read_f32_vec(triangle_count.saturating_mul(9))?;
            let triangles = values
                .chunks_exact(9)
                .map(|t| {
                    [
                        [t[0], t[1], t[2]],
                        [t[3], t[4], t[5]],
                        [t[6], t[7], t[8]],
                    ]
                })
                .collect();
            sections.push(HitSection {
                unk_count,
                flags,
                triangles,
            });
        }

        Ok(Self { sections })
    }

    fn encode(&self, out: &mut BinaryWriter, _scope: &mut EncodeScope<'_>) -> Result<()> {
        out.write_u32(count_u32("hit section count", self.sections.len())?);
        out.write_u32(count_u32("hit vertex size", self.triangle_count())?);
        for section in &self.sections {
            out.write_u32(count_u32("hit triangle count", section.triangles.len())?);
            out.write_u8(section.unk_count);
            out.write_bytes(&section.flags);
            for triangle in &section.triangles {
                for vertex in triangle {
                    out.write_f32_slice(vertex);
                }
            }
        }
        Ok(())
    }
}
