//! NDP3 writer.
//!
//! Output layout: header | group records | mesh records | materials |
//! face clump | vertex clump | additional vertex clump | names. Every
//! clump starts on a 16-byte boundary, and so does each mesh's data inside
//! it.

use std::collections::HashMap;

use xfbin_common::{BinaryWriter, IntoBytes};
use zerocopy::byteorder::big_endian::{F32, I16, U16, U32};

use crate::header::{
    MaterialHeader, MaterialTextureHeader, MeshGroupHeader, MeshHeader, NudHeader, PropertyHeader,
};
use crate::{BoneType, Error, Material, Mesh, Nud, Result, Vertex, VertexType, NUD_MAGIC};

const CLUMP_ALIGNMENT: usize = 16;
const RECORD_SIZE: usize = 0x30;

impl Nud {
    /// Serialize to NDP3 bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        check_count("mesh group", self.mesh_groups.len(), u16::MAX as usize)?;

        let mut names = NameTable::default();
        for group in &self.mesh_groups {
            check_count("mesh", group.meshes.len(), u16::MAX as usize)?;
            names.add(&group.name);
            for mesh in &group.meshes {
                check_mesh(mesh)?;
                for property in mesh.materials.iter().flat_map(|m| &m.properties) {
                    names.add(&property.name);
                }
            }
        }

        let mesh_count: usize = self.mesh_groups.iter().map(|g| g.meshes.len()).sum();
        let materials_start =
            NudHeader::SIZE + (self.mesh_groups.len() + mesh_count) * RECORD_SIZE;

        let mut materials = BinaryWriter::new();
        let mut poly = BinaryWriter::new();
        let mut vert = BinaryWriter::new();
        let mut vert_add = BinaryWriter::new();
        let mut mesh_records = Vec::with_capacity(mesh_count);

        for mesh in self.mesh_groups.iter().flat_map(|g| &g.meshes) {
            let mut tex_props = [U32::new(0); 4];
            for (slot, material) in tex_props.iter_mut().zip(&mesh.materials) {
                *slot = U32::new(to_u32(materials_start + materials.position())?);
                write_material(&mut materials, material, &names)?;
            }

            let poly_start = poly.position();
            poly.write_u16_slice(&mesh.faces);
            poly.align(CLUMP_ALIGNMENT);

            let vert_start = vert.position();
            let vert_add_start = vert_add.position();
            if mesh.bone_type == BoneType::None {
                for vertex in &mesh.vertices {
                    write_vertex(&mut vert, mesh, vertex)?;
                }
            } else {
                for vertex in &mesh.vertices {
                    write_skinned_color(&mut vert, mesh.uv_type(), vertex)?;
                    write_uvs(&mut vert, mesh.uv_count(), vertex);
                    write_vertex(&mut vert_add, mesh, vertex)?;
                }
            }
            vert.align(CLUMP_ALIGNMENT);
            vert_add.align(CLUMP_ALIGNMENT);

            mesh_records.push(MeshHeader {
                poly_start: U32::new(to_u32(poly_start)?),
                vert_start: U32::new(to_u32(vert_start)?),
                vert_add_start: U32::new(to_u32(vert_add_start)?),
                vertex_count: U16::new(mesh.vertices.len() as u16),
                vertex_size: mesh.vertex_size(),
                uv_size: mesh.uv_size,
                tex_props,
                face_count: U16::new(mesh.faces.len() as u16),
                face_size: mesh.face_size,
                face_flag: mesh.face_flag,
                _pad: [0; 12],
            });
        }

        let mut out = BinaryWriter::with_capacity(
            materials_start + materials.position() + poly.position() + vert.position() + vert_add.position(),
        );
        out.write_zeros(NudHeader::SIZE);

        for group in &self.mesh_groups {
            let record = MeshGroupHeader {
                bounding_sphere: group.bounding_sphere.map(F32::new),
                name_start: U32::new(names.offset(&group.name)),
                unk: U16::new(group.unk),
                bone_flags: U16::new(group.bone_flags),
                single_bind: U16::new(group.single_bind),
                mesh_count: U16::new(group.meshes.len() as u16),
                position_b: U32::new(group.position_b),
            };
            out.write_bytes(record.as_bytes());
        }
        for record in &mesh_records {
            out.write_bytes(record.as_bytes());
        }

        out.write_bytes(materials.as_bytes());
        out.align(CLUMP_ALIGNMENT);

        let poly_clump_start = out.position() - NudHeader::SIZE;
        out.write_bytes(poly.as_bytes());
        out.write_bytes(vert.as_bytes());
        out.write_bytes(vert_add.as_bytes());
        out.write_bytes(&names.into_bytes());
        out.align(CLUMP_ALIGNMENT);

        let header = NudHeader {
            magic: *NUD_MAGIC,
            file_size: U32::new(to_u32(out.position())?),
            version: U16::new(self.version),
            group_count: U16::new(self.mesh_groups.len() as u16),
            bone_type: U16::new(self.bone_type),
            bone_count: U16::new(self.bone_count),
            poly_clump_start: U32::new(to_u32(poly_clump_start)?),
            poly_clump_size: U32::new(to_u32(poly.position())?),
            vert_clump_size: U32::new(to_u32(vert.position())?),
            vert_add_clump_size: U32::new(to_u32(vert_add.position())?),
            bounding_sphere: self.bounding_sphere.map(F32::new),
        };

        let mut bytes = out.into_bytes();
        bytes[..NudHeader::SIZE].copy_from_slice(header.as_bytes());
        Ok(bytes)
    }
}

fn check_count(what: &'static str, count: usize, max: usize) -> Result<()> {
    if count > max {
        return Err(Error::CountOverflow { what, count, max });
    }
    Ok(())
}

fn check_mesh(mesh: &Mesh) -> Result<()> {
    check_count("vertex", mesh.vertices.len(), u16::MAX as usize)?;
    check_count("face index", mesh.faces.len(), u16::MAX as usize)?;
    if mesh.materials.len() > 4 {
        return Err(Error::TooManyMaterials(mesh.materials.len()));
    }
    for material in &mesh.materials {
        check_count("material texture", material.textures.len(), u16::MAX as usize)?;
        for property in &material.properties {
            check_count("property value", property.values.len(), u8::MAX as usize)?;
        }
    }
    Ok(())
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::CountOverflow {
        what: "byte offset",
        count: value,
        max: u32::MAX as usize,
    })
}

fn write_material(out: &mut BinaryWriter, material: &Material, names: &NameTable) -> Result<()> {
    let header = MaterialHeader {
        flags: U32::new(material.flags),
        _pad: U32::new(0),
        src_factor: U16::new(material.src_factor),
        texture_count: U16::new(material.textures.len() as u16),
        dst_factor: U16::new(material.dst_factor),
        alpha_test: material.alpha_test,
        alpha_function: material.alpha_function,
        ref_alpha: U16::new(material.ref_alpha),
        cull_mode: U16::new(material.cull_mode),
        unk1: U32::new(material.unk1),
        unk2: U32::new(material.unk2),
        z_buffer_offset: U32::new(material.z_buffer_offset),
    };
    out.write_bytes(header.as_bytes());

    for texture in &material.textures {
        let record = MaterialTextureHeader {
            hash: U32::new(texture.hash),
            _pad0: U32::new(0),
            unk0: U16::new(texture.unk0),
            map_mode: U16::new(texture.map_mode),
            wrap_mode_s: texture.wrap_mode_s,
            wrap_mode_t: texture.wrap_mode_t,
            min_filter: texture.min_filter,
            mag_filter: texture.mag_filter,
            mip_detail: texture.mip_detail,
            unk1: texture.unk1,
            _pad1: U32::new(0),
            unk2: I16::new(texture.unk2),
        };
        out.write_bytes(record.as_bytes());
    }

    if material.properties.is_empty() {
        // The chain needs at least one link; a valueless one reads back as nothing.
        let link = PropertyHeader {
            size: U32::new(0),
            name_start: U32::new(0),
            _pad0: [0; 3],
            value_count: 0,
            _pad1: U32::new(0),
        };
        out.write_bytes(link.as_bytes());
        return Ok(());
    }

    let last = material.properties.len() - 1;
    for (i, property) in material.properties.iter().enumerate() {
        let size = if i == last {
            0
        } else {
            std::mem::size_of::<PropertyHeader>() + property.values.len() * 4
        };
        let link = PropertyHeader {
            size: U32::new(to_u32(size)?),
            name_start: U32::new(names.offset(&property.name)),
            _pad0: [0; 3],
            value_count: property.values.len() as u8,
            _pad1: U32::new(0),
        };
        out.write_bytes(link.as_bytes());
        out.write_f32_slice(&property.values);
    }
    Ok(())
}

fn write_skinned_color(out: &mut BinaryWriter, uv_type: u8, vertex: &Vertex) -> Result<()> {
    let color = vertex.color.unwrap_or([0xFF; 4]);
    match uv_type {
        0 => {}
        2 => out.write_bytes(&color),
        4 => {
            for channel in color {
                out.write_f16(f32::from(channel) / 255.0);
            }
        }
        other => return Err(Error::UnsupportedUvType(other)),
    }
    Ok(())
}

fn write_uvs(out: &mut BinaryWriter, count: usize, vertex: &Vertex) {
    for i in 0..count {
        let uv = vertex.uv.get(i).copied().unwrap_or_default();
        out.write_f16_slice(&uv);
    }
}

fn write_vertex(out: &mut BinaryWriter, mesh: &Mesh, vertex: &Vertex) -> Result<()> {
    out.write_f32_slice(&vertex.position);

    let normal = vertex.normal.unwrap_or_default();
    let bitangent = vertex.bitangent.unwrap_or_default();
    let tangent = vertex.tangent.unwrap_or_default();

    match mesh.vertex_type {
        VertexType::NoNormals => out.write_f32(1.0),
        VertexType::NormalsFloat => {
            out.write_f32(1.0);
            out.write_f32_slice(&normal);
            out.write_f32(1.0);
        }
        VertexType::Unknown => {
            out.write_f32_slice(&normal);
            out.write_f32(1.0);
            out.write_zeros(3 * 3 * 4);
        }
        VertexType::NormalsTanBiTanFloat => {
            out.write_f32(1.0);
            out.write_f32_slice(&normal);
            out.write_f32(1.0);
            out.write_f32_slice(&bitangent);
            out.write_f32_slice(&tangent);
        }
        VertexType::NormalsHalfFloat => {
            out.write_f16_slice(&normal);
            out.write_f16(1.0);
        }
        VertexType::NormalsTanBiTanHalfFloat => {
            out.write_f16_slice(&normal);
            out.write_f16(1.0);
            out.write_f16_slice(&bitangent);
            out.write_f16_slice(&tangent);
        }
    }

    let ids = vertex.bone_ids.unwrap_or_default();
    let weights = vertex.bone_weights.unwrap_or_default();
    match mesh.bone_type {
        BoneType::None => {
            if mesh.uv_size >= 18 {
                out.write_bytes(&vertex.color.unwrap_or([0xFF; 4]));
            }
            write_uvs(out, mesh.uv_count(), vertex);
        }
        BoneType::Float => {
            out.write_u32_slice(&ids);
            out.write_f32_slice(&weights);
        }
        BoneType::HalfFloat => {
            for id in ids {
                out.write_u16(narrow(id, u16::MAX as u32)? as u16);
            }
            out.write_f16_slice(&weights);
        }
        BoneType::Byte => {
            for id in ids {
                out.write_u8(narrow(id, u8::MAX as u32)? as u8);
            }
            for weight in weights {
                out.write_u8((weight * 255.0).round().clamp(0.0, 255.0) as u8);
            }
        }
    }
    Ok(())
}

fn narrow(id: u32, max: u32) -> Result<u32> {
    if id > max {
        return Err(Error::CountOverflow {
            what: "bone id",
            count: id as usize,
            max: max as usize,
        });
    }
    Ok(id)
}

/// Null-terminated names, deduplicated by first-seen offset.
#[derive(Debug, Default)]
struct NameTable {
    names: Vec<String>,
    offsets: HashMap<String, u32>,
    len: u32,
}

impl NameTable {
    fn add(&mut self, name: &str) {
        if !self.offsets.contains_key(name) {
            self.offsets.insert(name.to_string(), self.len);
            self.len += name.len() as u32 + 1;
            self.names.push(name.to_string());
        }
    }

    fn offset(&self, name: &str) -> u32 {
        self.offsets.get(name).copied().unwrap_or(0)
    }

    fn into_bytes(self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len as usize);
        for name in self.names {
            bytes.extend_from_slice(name.as_bytes());
            bytes.push(0);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MaterialProperty, MaterialTexture, MeshGroup};

    fn textured_material() -> Material {
        Material {
            flags: 0x9601_1101,
            src_factor: 1,
            dst_factor: 2,
            cull_mode: 0x405,
            textures: vec![MaterialTexture {
                hash: 0xDEAD_0001,
                map_mode: 0,
                wrap_mode_s: 1,
                wrap_mode_t: 1,
                min_filter: 2,
                mag_filter: 2,
                mip_detail: 6,
                unk2: -1,
                ..Default::default()
            }],
            properties: vec![
                MaterialProperty {
                    name: "NU_colorSamplerUV".into(),
                    values: vec![1.0, 1.0, 0.0, 0.0],
                },
                MaterialProperty {
                    name: "NU_materialHash".into(),
                    values: vec![0.5],
                },
            ],
            ..Default::default()
        }
    }

    fn static_mesh() -> Mesh {
        Mesh {
            vertex_type: VertexType::NormalsFloat,
            bone_type: BoneType::None,
            uv_size: 0x12,
            vertices: (0..3)
                .map(|i| Vertex {
                    position: [i as f32, 0.0, 1.0],
                    normal: Some([0.0, 1.0, 0.0]),
                    color: Some([0x7F, 0x7F, 0x7F, 0xFF]),
                    uv: vec![[0.5, 0.25]],
                    ..Default::default()
                })
                .collect(),
            faces: vec![0, 1, 2],
            face_size: 0x04,
            materials: vec![textured_material()],
            ..Default::default()
        }
    }

    fn skinned_mesh() -> Mesh {
        Mesh {
            vertex_type: VertexType::NormalsHalfFloat,
            bone_type: BoneType::Byte,
            uv_size: 0x12,
            vertices: (0..4)
                .map(|i| Vertex {
                    position: [0.0, i as f32, 0.0],
                    normal: Some([1.0, 0.0, 0.0]),
                    color: Some([1, 2, 3, 4]),
                    uv: vec![[0.0, 1.0]],
                    bone_ids: Some([i, 0, 0, 0]),
                    bone_weights: Some([1.0, 0.0, 0.0, 0.0]),
                    ..Default::default()
                })
                .collect(),
            faces: vec![0, 1, 2, 3],
            face_size: 0x04,
            ..Default::default()
        }
    }

    #[test]
    fn test_write_then_parse() {
        let nud = Nud {
            version: 0x200,
            bone_type: 0,
            bone_count: 4,
            bounding_sphere: [0.0, 1.0, 0.0, 2.0],
            mesh_groups: vec![
                MeshGroup {
                    name: "body".into(),
                    bone_flags: 4,
                    single_bind: 0xFFFF,
                    meshes: vec![static_mesh()],
                    ..Default::default()
                },
                MeshGroup {
                    name: "arm".into(),
                    meshes: vec![skinned_mesh()],
                    ..Default::default()
                },
            ],
        };

        let bytes = nud.to_bytes().unwrap();
        assert_eq!(bytes.len() % CLUMP_ALIGNMENT, 0);
        assert!(Nud::is_nud(&bytes));

        let parsed = Nud::parse(&bytes).unwrap();
        assert_eq!(parsed, nud);
        assert_eq!(parsed.mesh_groups[1].meshes[0].triangles().len(), 2);
        assert_eq!(parsed.bone_range(), (0, 0));
    }

    #[test]
    fn test_material_without_properties() {
        let mut mesh = static_mesh();
        mesh.materials[0].properties.clear();
        let nud = Nud {
            mesh_groups: vec![MeshGroup {
                name: "g".into(),
                meshes: vec![mesh],
                ..Default::default()
            }],
            ..Default::default()
        };

        let parsed = Nud::parse(&nud.to_bytes().unwrap()).unwrap();
        let material = &parsed.mesh_groups[0].meshes[0].materials[0];
        assert!(material.properties.is_empty());
        assert_eq!(material.textures.len(), 1);
    }

    #[test]
    fn test_too_many_materials() {
        let mut mesh = static_mesh();
        mesh.materials = vec![Material::default(); 5];
        let nud = Nud {
            mesh_groups: vec![MeshGroup {
                meshes: vec![mesh],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(matches!(nud.to_bytes(), Err(Error::TooManyMaterials(5))));
    }
}
