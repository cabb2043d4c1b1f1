//! NDP3 parser.

use xfbin_common::BinaryReader;

use crate::header::{
    MaterialHeader, MaterialTextureHeader, MeshGroupHeader, MeshHeader, NudHeader, PropertyHeader,
};
use crate::{
    BoneType, Error, Material, MaterialProperty, MaterialTexture, Mesh, MeshGroup, Nud, Result,
    Vertex, VertexType, NUD_MAGIC,
};

/// Absolute offsets of the data sections, derived from the header.
#[derive(Debug, Clone, Copy)]
struct Sections {
    poly: usize,
    vert: usize,
    vert_add: usize,
    names: usize,
}

impl Nud {
    /// Check if data starts with the NDP3 magic.
    pub fn is_nud(data: &[u8]) -> bool {
        data.starts_with(NUD_MAGIC)
    }

    /// Parse an NDP3 file.
    ///
    /// Trailing bytes past the header's file size are ignored.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let header: NudHeader = reader.read_struct()?;
        if &header.magic != NUD_MAGIC {
            return Err(Error::InvalidMagic(header.magic));
        }

        let file_size = header.file_size.get() as usize;
        if file_size > data.len() {
            return Err(Error::SizeMismatch {
                declared: file_size,
                available: data.len(),
            });
        }

        let poly = header.poly_clump_start.get() as usize + NudHeader::SIZE;
        let vert = poly + header.poly_clump_size.get() as usize;
        let vert_add = vert + header.vert_clump_size.get() as usize;
        let names = vert_add + header.vert_add_clump_size.get() as usize;
        let sections = Sections {
            poly,
            vert,
            vert_add,
            names,
        };

        let mut group_headers = Vec::with_capacity(header.group_count.get() as usize);
        for _ in 0..header.group_count.get() {
            group_headers.push(reader.read_struct::<MeshGroupHeader>()?);
        }

        // All group records come first, then each group's mesh records in order.
        let mut mesh_groups = Vec::with_capacity(group_headers.len());
        for group in &group_headers {
            let name = read_name(&mut reader, sections.names + group.name_start.get() as usize)?;

            let mut meshes = Vec::with_capacity(group.mesh_count.get() as usize);
            for _ in 0..group.mesh_count.get() {
                let mesh_header: MeshHeader = reader.read_struct()?;
                meshes.push(read_mesh(&mut reader, &mesh_header, sections)?);
            }

            mesh_groups.push(MeshGroup {
                name,
                bounding_sphere: group.bounding_sphere.map(|f| f.get()),
                unk: group.unk.get(),
                bone_flags: group.bone_flags.get(),
                single_bind: group.single_bind.get(),
                position_b: group.position_b.get(),
                meshes,
            });
        }

        Ok(Nud {
            version: header.version.get(),
            bone_type: header.bone_type.get(),
            bone_count: header.bone_count.get(),
            bounding_sphere: header.bounding_sphere.map(|f| f.get()),
            mesh_groups,
        })
    }
}

fn read_name(reader: &mut BinaryReader<'_>, offset: usize) -> Result<String> {
    let name = reader.with_seek(offset, |r| r.read_cstring().map(str::to_owned))?;
    Ok(name)
}

fn read_mesh(reader: &mut BinaryReader<'_>, header: &MeshHeader, sections: Sections) -> Result<Mesh> {
    let vertex_type = VertexType::try_from(header.vertex_size & 0x0F)?;
    let bone_type = BoneType::try_from(header.vertex_size & 0xF0)?;
    let uv_size = header.uv_size;
    let vertex_count = header.vertex_count.get() as usize;

    let faces = reader.with_seek(
        sections.poly + header.poly_start.get() as usize,
        |r| r.read_u16_vec(header.face_count.get() as usize),
    )?;

    let vertices = reader.with_seek(sections.vert + header.vert_start.get() as usize, |r| {
        if bone_type == BoneType::None {
            return (0..vertex_count)
                .map(|_| read_vertex(r, vertex_type, bone_type, uv_size))
                .collect::<Result<Vec<_>>>();
        }

        // Skinned meshes keep colors and UVs in the vertex clump and the
        // positions plus bone data in the additional clump.
        let uv_count = (uv_size >> 4) as usize;
        let mut extras = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let color = read_skinned_color(r, uv_size & 0x0F)?;
            let mut uv = Vec::with_capacity(uv_count);
            for _ in 0..uv_count {
                uv.push([r.read_f16()?, r.read_f16()?]);
            }
            extras.push((color, uv));
        }

        r.seek(sections.vert_add + header.vert_add_start.get() as usize)?;
        extras
            .into_iter()
            .map(|(color, uv)| {
                let mut vertex = read_vertex(r, vertex_type, bone_type, uv_size)?;
                vertex.color = color;
                vertex.uv = uv;
                Ok(vertex)
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let mut materials = Vec::new();
    for offset in header.tex_props.iter().map(|o| o.get() as usize) {
        if offset == 0 {
            break;
        }
        materials.push(reader.with_seek(offset, |r| read_material(r, sections.names))?);
    }

    Ok(Mesh {
        vertex_type,
        bone_type,
        uv_size,
        vertices,
        faces,
        face_size: header.face_size,
        face_flag: header.face_flag,
        materials,
    })
}

fn read_skinned_color(reader: &mut BinaryReader<'_>, uv_type: u8) -> Result<Option<[u8; 4]>> {
    match uv_type {
        0 => Ok(None),
        2 => Ok(Some(reader.read_array::<4>()?)),
        4 => {
            let mut color = [0u8; 4];
            for channel in &mut color {
                *channel = (reader.read_f16()? * 255.0).round().clamp(0.0, 255.0) as u8;
            }
            Ok(Some(color))
        }
        other => Err(Error::UnsupportedUvType(other)),
    }
}

fn read_vertex(
    reader: &mut BinaryReader<'_>,
    vertex_type: VertexType,
    bone_type: BoneType,
    uv_size: u8,
) -> Result<Vertex> {
    let mut vertex = Vertex {
        position: reader.read_f32_array::<3>()?,
        ..Default::default()
    };

    match vertex_type {
        VertexType::NoNormals => {
            reader.read_f32()?;
        }
        VertexType::NormalsFloat => {
            reader.read_f32()?;
            vertex.normal = Some(reader.read_f32_array::<3>()?);
            reader.read_f32()?;
        }
        VertexType::Unknown => {
            vertex.normal = Some(reader.read_f32_array::<3>()?);
            reader.read_f32()?;
            reader.skip(3 * 3 * 4)?;
        }
        VertexType::NormalsTanBiTanFloat => {
            reader.read_f32()?;
            vertex.normal = Some(reader.read_f32_array::<3>()?);
            reader.read_f32()?;
            vertex.bitangent = Some(reader.read_f32_array::<4>()?);
            vertex.tangent = Some(reader.read_f32_array::<4>()?);
        }
        VertexType::NormalsHalfFloat => {
            vertex.normal = Some(read_f16_array::<3>(reader)?);
            reader.read_f16()?;
        }
        VertexType::NormalsTanBiTanHalfFloat => {
            vertex.normal = Some(read_f16_array::<3>(reader)?);
            reader.read_f16()?;
            vertex.bitangent = Some(read_f16_array::<4>(reader)?);
            vertex.tangent = Some(read_f16_array::<4>(reader)?);
        }
    }

    match bone_type {
        BoneType::None => {
            if uv_size >= 18 {
                vertex.color = Some(reader.read_array::<4>()?);
            }
            for _ in 0..(uv_size >> 4) {
                vertex.uv.push([reader.read_f16()?, reader.read_f16()?]);
            }
        }
        BoneType::Float => {
            let ids = reader.read_u32_vec(4)?;
            vertex.bone_ids = Some([ids[0], ids[1], ids[2], ids[3]]);
            vertex.bone_weights = Some(reader.read_f32_array::<4>()?);
        }
        BoneType::HalfFloat => {
            let ids = reader.read_u16_vec(4)?;
            vertex.bone_ids = Some(ids_from(&ids));
            vertex.bone_weights = Some(read_f16_array::<4>(reader)?);
        }
        BoneType::Byte => {
            let ids = reader.read_array::<4>()?;
            let weights = reader.read_array::<4>()?;
            vertex.bone_ids = Some(ids.map(u32::from));
            vertex.bone_weights = Some(weights.map(|w| f32::from(w) / 255.0));
        }
    }

    Ok(vertex)
}

fn ids_from(ids: &[u16]) -> [u32; 4] {
    [ids[0], ids[1], ids[2], ids[3]].map(u32::from)
}

fn read_f16_array<const N: usize>(reader: &mut BinaryReader<'_>) -> Result<[f32; N]> {
    let mut out = [0.0f32; N];
    for value in &mut out {
        *value = reader.read_f16()?;
    }
    Ok(out)
}

fn read_material(reader: &mut BinaryReader<'_>, names: usize) -> Result<Material> {
    let header: MaterialHeader = reader.read_struct()?;

    let mut textures = Vec::with_capacity(header.texture_count.get() as usize);
    for _ in 0..header.texture_count.get() {
        let texture: MaterialTextureHeader = reader.read_struct()?;
        textures.push(MaterialTexture {
            hash: texture.hash.get(),
            unk0: texture.unk0.get(),
            map_mode: texture.map_mode.get(),
            wrap_mode_s: texture.wrap_mode_s,
            wrap_mode_t: texture.wrap_mode_t,
            min_filter: texture.min_filter,
            mag_filter: texture.mag_filter,
            mip_detail: texture.mip_detail,
            unk1: texture.unk1,
            unk2: texture.unk2.get(),
        });
    }

    let mut properties = Vec::new();
    loop {
        let start = reader.position();
        let link: PropertyHeader = reader.read_struct()?;

        if link.value_count != 0 {
            let name = read_name(reader, names + link.name_start.get() as usize)?;
            let values = reader.read_f32_vec(link.value_count as usize)?;
            properties.push(MaterialProperty { name, values });
        }

        if link.size.get() == 0 {
            break;
        }
        reader.seek(start + link.size.get() as usize)?;
    }

    Ok(Material {
        flags: header.flags.get(),
        src_factor: header.src_factor.get(),
        dst_factor: header.dst_factor.get(),
        alpha_test: header.alpha_test,
        alpha_function: header.alpha_function,
        ref_alpha: header.ref_alpha.get(),
        cull_mode: header.cull_mode.get(),
        unk1: header.unk1.get(),
        unk2: header.unk2.get(),
        z_buffer_offset: header.z_buffer_offset.get(),
        textures,
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_magic() {
        let data = [0u8; 0x30];
        assert!(matches!(Nud::parse(&data), Err(Error::InvalidMagic(_))));
        assert!(!Nud::is_nud(&data));
    }

    #[test]
    fn test_rejects_truncated_header() {
        assert!(matches!(Nud::parse(b"NDP3"), Err(Error::Common(_))));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let mut data = vec![0u8; 0x30];
        data[..4].copy_from_slice(NUD_MAGIC);
        data[4..8].copy_from_slice(&0x100u32.to_be_bytes());
        assert!(matches!(
            Nud::parse(&data),
            Err(Error::SizeMismatch {
                declared: 0x100,
                available: 0x30
            })
        ));
    }
}
