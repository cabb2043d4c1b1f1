//! Spring bones and collision spheres.
//!
//! ```text
//! u16 spring group count, u16 collision sphere count
//! u32 clump                        page-local index
//! spring groups:  f32 values[4], u16 coord, u16 bone count
//! spheres:        f32 offset[3], f32 scale[3], u16 coord, u16 attach
//!                 (current shape)  u16 attached count, u16 padding
//! (current shape) u16 attached coords[sum of attached counts]
//! ```
//!
//! Records with an id below [`LEGACY_RECORD_ID`] use the legacy shape, which
//! has no attached coord lists.

use xfbin_common::{BinaryReader, BinaryWriter};

use super::{ChunkCodec, LEGACY_RECORD_ID};
use crate::error::count_u16;
use crate::{ChunkId, ChunkKind, DecodeScope, EncodeScope, Error, Result};

/// The two historical payload shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DynamicsShape {
    Legacy,
    #[default]
    Current,
}

impl DynamicsShape {
    pub fn for_record_id(id: u16) -> Self {
        if id < LEGACY_RECORD_ID {
            Self::Legacy
        } else {
            Self::Current
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpringGroup {
    /// Dampening, tension and two unknowns.
    pub values: [f32; 4],
    /// Index into the clump's coord list.
    pub coord_index: u16,
    pub bone_count: u16,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionSphere {
    pub offset: [f32; 3],
    pub scale: [f32; 3],
    /// Index into the clump's coord list.
    pub coord_index: u16,
    pub attach: u16,
    /// Coord indices this sphere collides with; always empty in the legacy shape.
    pub attached: Vec<u16>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dynamics {
    pub shape: DynamicsShape,
    pub clump: Option<ChunkId>,
    pub spring_groups: Vec<SpringGroup>,
    pub collision_spheres: Vec<CollisionSphere>,
}

impl ChunkCodec for Dynamics {
    const KIND: ChunkKind = ChunkKind::Dynamics;

    fn decode(reader: &mut BinaryReader<'_>, scope: &DecodeScope<'_>) -> Result<Self> {
        let shape = DynamicsShape::for_record_id(scope.ids().id);
        let spring_count = reader.read_u16()? as usize;
        let sphere_count = reader.read_u16()? as usize;
        let clump = scope.optional_chunk(reader.read_u32()?)?;

        let mut spring_groups = Vec::with_capacity(spring_count);
        for _ in 0..spring_count {
            spring_groups.push(SpringGroup {
                values: reader.read_f32_array()?,
                coord_index: reader.read_u16()?,
                bone_count: reader.read_u16()?,
            });
        }

        let mut collision_spheres = Vec::with_capacity(sphere_count);
        let mut attached_counts = Vec::with_capacity(sphere_count);
        for _ in 0..sphere_count {
            collision_spheres.push(CollisionSphere {
                offset: reader.read_f32_array()?,
                scale: reader.read_f32_array()?,
                coord_index: reader.read_u16()?,
                attach: reader.read_u16()?,
                attached: Vec::new(),
            });
            if shape == DynamicsShape::Current {
                attached_counts.push(reader.read_u16()? as usize);
                reader.skip(2)?;
            }
        }

        for (sphere, count) in collision_spheres.iter_mut().zip(attached_counts) {
            sphere.attached = reader.read_u16_vec(count)?;
        }

        Ok(Self {
            shape,
            clump,
            spring_groups,
            collision_spheres,
        })
    }

    fn encode(&self, out: &mut BinaryWriter, scope: &mut EncodeScope<'_>) -> Result<()> {
        if self.shape == DynamicsShape::Legacy {
            if let Some(sphere) = self.collision_spheres.iter().find(|s| !s.attached.is_empty()) {
                return Err(Error::invalid(
                    "dynamics",
                    format!(
                        "legacy shape cannot store attached coords (sphere on coord {})",
                        sphere.coord_index
                    ),
                ));
            }
        }

        out.write_u16(count_u16("spring group count", self.spring_groups.len())?);
        out.write_u16(count_u16("collision sphere count", self.collision_spheres.len())?);
        out.write_u32(scope.optional_index(self.clump)?);

        for group in &self.spring_groups {
            out.write_f32_slice(&group.values);
            out.write_u16(group.coord_index);
            out.write_u16(group.bone_count);
        }

        for sphere in &self.collision_spheres {
            out.write_f32_slice(&sphere.offset);
            out.write_f32_slice(&sphere.scale);
            out.write_u16(sphere.coord_index);
            out.write_u16(sphere.attach);
            if self.shape == DynamicsShape::Current {
                out.write_u16(count_u16("attached coord count", sphere.attached.len())?);
                out.write_u16(0);
            }
        }

        for sphere in &self.collision_spheres {
            out.write_u16_slice(&sphere.attached);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::test_support::TestPage;
    use crate::RecordIds;

    fn dynamics(page: &TestPage) -> Dynamics {
        Dynamics {
            shape: DynamicsShape::Current,
            clump: Some(page.locals[1]),
            spring_groups: vec![SpringGroup {
                values: [0.5, 0.2, 0.0, 1.0],
                coord_index: 3,
                bone_count: 2,
            }],
            collision_spheres: vec![
                CollisionSphere {
                    offset: [0.0, 1.0, 0.0],
                    scale: [1.0; 3],
                    coord_index: 1,
                    attach: 1,
                    attached: vec![3, 4],
                },
                CollisionSphere {
                    coord_index: 2,
                    attached: vec![5],
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_attached_coords_follow_spheres() {
        let page = TestPage::new(&[("nuccChunkClump", "body")]);
        let dynamics = dynamics(&page);
        let bytes = page.encode(&dynamics);

        // Header, one spring group, two 32-byte spheres, three trailing shorts.
        assert_eq!(bytes.len(), 8 + 20 + 2 * 32 + 6);
        assert_eq!(&bytes[bytes.len() - 6..], &[0, 3, 0, 4, 0, 5]);

        assert_eq!(page.decode::<Dynamics>(&bytes).unwrap(), dynamics);
    }

    #[test]
    fn test_legacy_shape_by_record_id() {
        let page = TestPage::new(&[("nuccChunkClump", "body")]);
        let mut dynamics = dynamics(&page);
        dynamics.shape = DynamicsShape::Legacy;
        for sphere in &mut dynamics.collision_spheres {
            sphere.attached.clear();
        }

        let bytes = page.encode(&dynamics);
        assert_eq!(bytes.len(), 8 + 20 + 2 * 28);

        let scope = page.scope().with_ids(RecordIds { id: 0x66, unk: 0 });
        let mut reader = BinaryReader::new(&bytes);
        let decoded = Dynamics::decode(&mut reader, &scope).unwrap();
        assert_eq!(decoded, dynamics);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_legacy_shape_rejects_attached_coords() {
        let page = TestPage::new(&[("nuccChunkClump", "body")]);
        let mut dynamics = dynamics(&page);
        dynamics.shape = DynamicsShape::Legacy;
        let mut scope = EncodeScope::new(&page.arena, Vec::new());
        let mut out = BinaryWriter::new();
        assert!(dynamics.encode(&mut out, &mut scope).is_err());
    }

    #[test]
    fn test_null_clump_is_absent() {
        let page = TestPage::new(&[]);
        let dynamics = Dynamics::default();
        let bytes = page.encode(&dynamics);
        assert_eq!(bytes, [0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(page.decode::<Dynamics>(&bytes).unwrap().clump, None);
    }
}
