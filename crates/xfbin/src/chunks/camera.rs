//! Camera settings.

use xfbin_common::{BinaryReader, BinaryWriter};

use super::ChunkCodec;
use crate::{ChunkKind, DecodeScope, EncodeScope, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub field00: u32,
    /// Vertical field of view in degrees.
    pub fov: f32,
}

impl ChunkCodec for Camera {
    const KIND: ChunkKind = ChunkKind::Camera;

    fn decode(reader: &mut BinaryReader<'_>, _scope: &DecodeScope<'_>) -> Result<Self> {
        Ok(Self {
            field00: reader.read_u32()?,
            fov: reader.read_f32()?,
        })
    }

    fn encode(&self, out: &mut BinaryWriter, _scope: &mut EncodeScope<'_>) -> Result<()> {
        out.write_u32(self.field00);
        out.write_f32(self.fov);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::test_support::TestPage;

    #[test]
    fn test_camera() {
        let page = TestPage::new(&[]);
        let camera = Camera {
            field00: 0,
            fov: 45.0,
        };
        let bytes = page.encode(&camera);
        assert_eq!(bytes, [0, 0, 0, 0, 0x42, 0x34, 0, 0]);
        assert_eq!(page.decode::<Camera>(&bytes).unwrap(), camera);
    }
}
