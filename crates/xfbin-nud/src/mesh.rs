//! In-memory NDP3 mesh model.

use crate::strip;
use crate::{Error, Result};

/// A decoded NDP3 mesh file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Nud {
    pub version: u16,
    /// Bone type recorded in the file header.
    pub bone_type: u16,
    pub bone_count: u16,
    pub bounding_sphere: [f32; 4],
    pub mesh_groups: Vec<MeshGroup>,
}

impl Nud {
    /// Lowest and highest bone id referenced by the first mesh group.
    ///
    /// Returns `(0, 0)` for unskinned meshes.
    pub fn bone_range(&self) -> (u32, u32) {
        let Some(group) = self.mesh_groups.first() else {
            return (0, 0);
        };
        match group.meshes.first() {
            Some(mesh) if mesh.bone_type != BoneType::None => {}
            _ => return (0, 0),
        }

        let mut lower = 0xFFFF;
        let mut higher = 0;
        for mesh in group.meshes.iter().filter(|m| m.has_bones()) {
            for ids in mesh.vertices.iter().filter_map(|v| v.bone_ids) {
                for id in ids {
                    lower = lower.min(id);
                    higher = higher.max(id);
                }
            }
        }

        if lower > higher {
            (0, 0)
        } else {
            (lower, higher)
        }
    }
}

/// A named group of meshes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshGroup {
    pub name: String,
    pub bounding_sphere: [f32; 8],
    pub unk: u16,
    pub bone_flags: u16,
    pub single_bind: u16,
    pub position_b: u32,
    pub meshes: Vec<Mesh>,
}

/// Vertex attribute layout, the low nibble of a mesh's vertex size byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum VertexType {
    #[default]
    NoNormals = 0,
    NormalsFloat = 1,
    Unknown = 2,
    NormalsTanBiTanFloat = 3,
    NormalsHalfFloat = 6,
    NormalsTanBiTanHalfFloat = 7,
}

impl TryFrom<u8> for VertexType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::NoNormals,
            1 => Self::NormalsFloat,
            2 => Self::Unknown,
            3 => Self::NormalsTanBiTanFloat,
            6 => Self::NormalsHalfFloat,
            7 => Self::NormalsTanBiTanHalfFloat,
            other => return Err(Error::UnsupportedVertexType(other)),
        })
    }
}

/// Bone influence layout, the high nibble of a mesh's vertex size byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum BoneType {
    #[default]
    None = 0,
    Float = 0x10,
    HalfFloat = 0x20,
    Byte = 0x40,
}

impl TryFrom<u8> for BoneType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => Self::None,
            0x10 => Self::Float,
            0x20 => Self::HalfFloat,
            0x40 => Self::Byte,
            other => return Err(Error::UnsupportedBoneType(other)),
        })
    }
}

/// Face flag bit selecting a plain triangle list instead of a strip.
pub const FACE_SIZE_TRIANGLE_LIST: u8 = 0x40;

/// A single mesh: vertex buffer, face indices, and materials.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertex_type: VertexType,
    pub bone_type: BoneType,
    /// UV count in the high nibble, UV/color type in the low nibble.
    pub uv_size: u8,
    pub vertices: Vec<Vertex>,
    /// Raw face indices as stored; strips use [`strip::STRIP_RESTART`].
    pub faces: Vec<u16>,
    pub face_size: u8,
    pub face_flag: u8,
    pub materials: Vec<Material>,
}

impl Mesh {
    pub const MAX_VERTICES: usize = 32_767;
    pub const MAX_FACES: usize = 16_383;

    /// Packed vertex size byte as stored in the mesh record.
    pub fn vertex_size(&self) -> u8 {
        self.bone_type as u8 | self.vertex_type as u8
    }

    pub fn uv_count(&self) -> usize {
        (self.uv_size >> 4) as usize
    }

    pub fn uv_type(&self) -> u8 {
        self.uv_size & 0x0F
    }

    pub fn has_bones(&self) -> bool {
        self.vertices.first().is_some_and(|v| v.bone_ids.is_some())
    }

    pub fn has_color(&self) -> bool {
        self.vertices.first().is_some_and(|v| v.color.is_some())
    }

    pub fn uv_channel_count(&self) -> usize {
        self.vertices.first().map_or(0, |v| v.uv.len())
    }

    /// Decode the face indices into triangles.
    ///
    /// Meshes flagged as triangle lists are read three indices at a time;
    /// everything else goes through the strip walk.
    pub fn triangles(&self) -> Vec<[u16; 3]> {
        if self.face_size & FACE_SIZE_TRIANGLE_LIST != 0 {
            strip::list_to_triangles(&self.faces)
        } else {
            strip::strip_to_triangles(&self.faces)
        }
    }
}

/// One vertex. Optional attributes are present depending on the mesh's
/// vertex and bone types.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: Option<[f32; 3]>,
    pub bitangent: Option<[f32; 4]>,
    pub tangent: Option<[f32; 4]>,
    pub color: Option<[u8; 4]>,
    pub uv: Vec<[f32; 2]>,
    pub bone_ids: Option<[u32; 4]>,
    pub bone_weights: Option<[f32; 4]>,
}

/// Render state and texture bindings of one mesh pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    pub flags: u32,
    pub src_factor: u16,
    pub dst_factor: u16,
    pub alpha_test: u8,
    pub alpha_function: u8,
    pub ref_alpha: u16,
    pub cull_mode: u16,
    pub unk1: u32,
    pub unk2: u32,
    pub z_buffer_offset: u32,
    pub textures: Vec<MaterialTexture>,
    pub properties: Vec<MaterialProperty>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialTexture {
    pub hash: u32,
    pub unk0: u16,
    pub map_mode: u16,
    pub wrap_mode_s: u8,
    pub wrap_mode_t: u8,
    pub min_filter: u8,
    pub mag_filter: u8,
    pub mip_detail: u8,
    pub unk1: u8,
    pub unk2: i16,
}

/// Named float parameter, e.g. `NU_colorSamplerUV`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialProperty {
    pub name: String,
    pub values: Vec<f32>,
}
