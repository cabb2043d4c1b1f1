//! Texture chunks wrapping an NTP3 file.

use xfbin_common::{BinaryReader, BinaryWriter};
use xfbin_nut::Nut;

use super::ChunkCodec;
use crate::error::count_u32;
use crate::{ChunkKind, DecodeScope, EncodeScope, Result};

/// A texture chunk.
///
/// The header dimensions are placeholders written by the game's exporter;
/// the real sizes live in the embedded [`Nut`].
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub field00: u16,
    pub width: u16,
    pub height: u16,
    pub field06: u16,
    pub nut: Nut,
}

impl Texture {
    /// Wrap a NUT, copying the first texture's dimensions into the header.
    pub fn from_nut(nut: Nut) -> Self {
        let (width, height) = nut
            .textures
            .first()
            .map_or((0, 0), |texture| (texture.width, texture.height));
        Self {
            field00: 0,
            width,
            height,
            field06: 0,
            nut,
        }
    }
}

impl ChunkCodec for Texture {
    const KIND: ChunkKind = ChunkKind::Texture;

    fn decode(reader: &mut BinaryReader<'_>, _scope: &DecodeScope<'_>) -> Result<Self> {
        let field00 = reader.read_u16()?;
        let width = reader.read_u16()?;
        let height = reader.read_u16()?;
        let field06 = reader.read_u16()?;
        let nut_size = reader.read_u32()? as usize;
        let nut = Nut::parse(reader.read_bytes(nut_size)?)?;

        Ok(Self {
            field00,
            width,
            height,
            field06,
            nut,
        })
    }

    fn encode(&self, out: &mut BinaryWriter, _scope: &mut EncodeScope<'_>) -> Result<()> {
        let nut = self.nut.to_bytes()?;
        out.write_u16(self.field00);
        out.write_u16(self.width);
        out.write_u16(self.height);
        out.write_u16(self.field06);
        out.write_u32(count_u32("NUT size", nut.len())?);
        out.write_bytes(&nut);
        Ok(())
    }
}
