//! Material parameters and texture bindings.
//!
//! ```text
//! u16 group count, u16 field02, f32 field04
//! u8 format, u8 field09, u8 alpha, u8 glare
//! f32 floats[float_count(format)]
//! texture groups: i16 count, u16 unk, u32 field04, u32 texture[count]
//! ```

use xfbin_common::{BinaryReader, BinaryWriter};

use super::{read_chunk_ids, write_chunk_ids, ChunkCodec};
use crate::error::count_u16;
use crate::{ChunkId, ChunkKind, DecodeScope, EncodeScope, Error, Result};

/// Floats contributed by each bit of the format byte.
const FORMAT_FLOATS: [(u8, usize); 8] = [
    (0x01, 4),
    (0x02, 1),
    (0x04, 1),
    (0x08, 1),
    (0x10, 2),
    (0x20, 1),
    (0x40, 1),
    (0x80, 0),
];

/// Number of floats stored after the header for a format byte.
pub fn float_count(format: u8) -> usize {
    FORMAT_FLOATS
        .iter()
        .filter(|(bit, _)| format & bit != 0)
        .map(|(_, floats)| floats)
        .sum()
}

/// Textures bound to one shader slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureGroup {
    pub unk: u16,
    pub field04: u32,
    pub textures: Vec<ChunkId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    pub field02: u16,
    pub field04: f32,
    pub format: u8,
    pub field09: u8,
    pub alpha: u8,
    pub glare: u8,
    /// Exactly [`float_count`]`(format)` values.
    pub floats: Vec<f32>,
    pub texture_groups: Vec<TextureGroup>,
}

impl Material {
    /// Check the float list against the format byte.
    pub fn validate(&self) -> Result<()> {
        let expected = float_count(self.format);
        if self.floats.len() != expected {
            return Err(Error::MaterialFloatCount {
                format: self.format,
                expected,
                actual: self.floats.len(),
            });
        }
        Ok(())
    }

    pub fn textures(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.texture_groups
            .iter()
            .flat_map(|group| group.textures.iter().copied())
    }
}

impl ChunkCodec for Material {
    const KIND: ChunkKind = ChunkKind::Material;

    fn decode(reader: &mut BinaryReader<'_>, scope: &DecodeScope<'_>) -> Result<Self> {
        let group_count = reader.read_u16()? as usize;
        let field02 = reader.read_u16()?;
        let field04 = reader.read_f32()?;
        let format = reader.read_u8()?;
        let field09 = reader.read_u8()?;
        let alpha = reader.read_u8()?;
        let glare = reader.read_u8()?;
        let floats = reader.read_f32_vec(float_count(format))?;

        let mut texture_groups = Vec::with_capacity(group_count);
        for _ in 0..group_count {
            let count = reader.read_i16()?;
            let count = usize::try_from(count)
                .map_err(|_| Error::invalid("material", format!("texture group count {count}")))?;
            let unk = reader.read_u16()?;
            let field04 = reader.read_u32()?;
            let textures = read_chunk_ids(reader, scope, count)?;
            texture_groups.push(TextureGroup {
                unk,
                field04,
                textures,
            });
        }

        Ok(Self {
            field02,
            field04,
            format,
            field09,
            alpha,
            glare,
            floats,
            texture_groups,
        })
    }

    fn encode(&self, out: &mut BinaryWriter, scope: &mut EncodeScope<'_>) -> Result<()> {
        self.validate()?;

        out.write_u16(count_u16("texture group count", self.texture_groups.len())?);
        out.write_u16(self.field02);
        out.write_f32(self.field04);
        out.write_u8(self.format);
        out.write_u8(self.field09);
        out.write_u8(self.alpha);
        out.write_u8(self.glare);
        out.write_f32_slice(&self.floats);

        for group in &self.texture_groups {
            let count = i16::try_from(group.textures.len())
                .map_err(|_| Error::overflow("texture group size", group.textures.len()))?;
            out.write_i16(count);
            out.write_u16(group.unk);
            out.write_u32(group.field04);
            write_chunk_ids(out, scope, &group.textures)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::test_support::TestPage;

    #[test]
    fn test_float_count() {
        assert_eq!(float_count(0b0101_0000), 3);
        assert_eq!(float_count(0), 0);
        assert_eq!(float_count(0x01), 4);
        assert_eq!(float_count(0x80), 0);
        assert_eq!(float_count(0xFF), 11);
    }

    #[test]
    fn test_material_round_trip() {
        let page = TestPage::new(&[("nuccChunkTexture", "eye"), ("nuccChunkTexture", "skin")]);
        let material = Material {
            field04: 0.5,
            format: 0x50,
            alpha: 0xFF,
            floats: vec![1.0, 2.0, 3.0],
            texture_groups: vec![TextureGroup {
                unk: 0,
                field04: 0x10,
                textures: vec![page.locals[2], page.locals[1]],
            }],
            ..Default::default()
        };

        let bytes = page.encode(&material);
        // 12-byte header, 3 floats, 8-byte group header, 2 indices.
        assert_eq!(bytes.len(), 12 + 12 + 8 + 8);
        let decoded: Material = page.decode(&bytes).unwrap();
        assert_eq!(decoded, material);
        assert_eq!(decoded.floats.len(), float_count(decoded.format));
    }

    #[test]
    fn test_float_count_checked_before_encode() {
        let material = Material {
            format: 0x50,
            floats: vec![1.0; 4],
            ..Default::default()
        };
        assert!(matches!(
            material.validate(),
            Err(Error::MaterialFloatCount {
                format: 0x50,
                expected: 3,
                actual: 4
            })
        ));
    }
}
