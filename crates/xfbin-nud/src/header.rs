//! Fixed-size NDP3 records.
//!
//! All records are big-endian and byte-aligned, so they are read and
//! written directly through zerocopy.

use zerocopy::byteorder::big_endian::{F32, I16, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// NDP3 file header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct NudHeader {
    /// Magic bytes ("NDP3").
    pub magic: [u8; 4],
    /// Total file size in bytes.
    pub file_size: U32,
    pub version: U16,
    pub group_count: U16,
    pub bone_type: U16,
    pub bone_count: U16,
    /// Start of the face clump, relative to the end of this header.
    pub poly_clump_start: U32,
    pub poly_clump_size: U32,
    pub vert_clump_size: U32,
    pub vert_add_clump_size: U32,
    pub bounding_sphere: [F32; 4],
}

impl NudHeader {
    /// Header size; every clump offset is measured from here.
    pub const SIZE: usize = 0x30;
}

/// Mesh group record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct MeshGroupHeader {
    pub bounding_sphere: [F32; 8],
    /// Offset of the group name within the name section.
    pub name_start: U32,
    pub unk: U16,
    pub bone_flags: U16,
    pub single_bind: U16,
    pub mesh_count: U16,
    pub position_b: U32,
}

/// Mesh record. Clump offsets are relative to the start of each clump.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct MeshHeader {
    pub poly_start: U32,
    pub vert_start: U32,
    pub vert_add_start: U32,
    pub vertex_count: U16,
    /// Bone type in the high nibble, vertex type in the low nibble.
    pub vertex_size: u8,
    /// UV count in the high nibble, UV/color type in the low nibble.
    pub uv_size: u8,
    /// Absolute offsets of up to four material records; zero ends the list.
    pub tex_props: [U32; 4],
    pub face_count: U16,
    pub face_size: u8,
    pub face_flag: u8,
    pub _pad: [u8; 12],
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct MaterialHeader {
    pub flags: U32,
    pub _pad: U32,
    pub src_factor: U16,
    pub texture_count: U16,
    pub dst_factor: U16,
    pub alpha_test: u8,
    pub alpha_function: u8,
    pub ref_alpha: U16,
    pub cull_mode: U16,
    pub unk1: U32,
    pub unk2: U32,
    pub z_buffer_offset: U32,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct MaterialTextureHeader {
    pub hash: U32,
    pub _pad0: U32,
    pub unk0: U16,
    pub map_mode: U16,
    pub wrap_mode_s: u8,
    pub wrap_mode_t: u8,
    pub min_filter: u8,
    pub mag_filter: u8,
    pub mip_detail: u8,
    pub unk1: u8,
    pub _pad1: U32,
    pub unk2: I16,
}

/// Material property link; `size` is the distance to the next link, zero on the last.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct PropertyHeader {
    pub size: U32,
    pub name_start: U32,
    pub _pad0: [u8; 3],
    pub value_count: u8,
    pub _pad1: U32,
}
