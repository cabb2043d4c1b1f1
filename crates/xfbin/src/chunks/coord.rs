//! Bone transforms.

use xfbin_common::{BinaryReader, BinaryWriter};

use super::ChunkCodec;
use crate::{ChunkKind, DecodeScope, EncodeScope, Result};

/// A coord (bone) node's local transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub position: [f32; 3],
    /// Euler angles in degrees.
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub unk_float: f32,
    pub unk_short: u16,
}

impl Default for Coord {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
            unk_float: 1.0,
            unk_short: 0,
        }
    }
}

impl ChunkCodec for Coord {
    const KIND: ChunkKind = ChunkKind::Coord;

    fn decode(reader: &mut BinaryReader<'_>, _scope: &DecodeScope<'_>) -> Result<Self> {
        Ok(Self {
            position: reader.read_f32_array()?,
            rotation: reader.read_f32_array()?,
            scale: reader.read_f32_array()?,
            unk_float: reader.read_f32()?,
            unk_short: reader.read_u16()?,
        })
    }

    fn encode(&self, out: &mut BinaryWriter, _scope: &mut EncodeScope<'_>) -> Result<()> {
        out.write_f32_slice(&self.position);
        out.write_f32_slice(&self.rotation);
        out.write_f32_slice(&self.scale);
        out.write_f32(self.unk_float);
        out.write_u16(self.unk_short);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::test_support::TestPage;

    #[test]
    fn test_coord_layout() {
        let page = TestPage::new(&[]);
        let coord = Coord {
            position: [1.0, 2.0, 3.0],
            rotation: [0.0, 90.0, 0.0],
            unk_short: 7,
            ..Default::default()
        };
        let bytes = page.encode(&coord);
        assert_eq!(bytes.len(), 42);
        assert_eq!(&bytes[..4], &1.0f32.to_be_bytes());
        assert_eq!(page.decode::<Coord>(&bytes).unwrap(), coord);
    }

    #[test]
    fn test_truncated_coord() {
        let page = TestPage::new(&[]);
        assert!(page.decode::<Coord>(&[0; 40]).is_err());
    }
}
