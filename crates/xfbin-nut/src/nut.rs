//! NTP3 file parsing and writing.

use xfbin_common::{BinaryReader, BinaryWriter};

use crate::{Error, NutTexture, Result, NUT_MAGIC};

/// Version from which the first offset word holds the data offset.
const DATA_OFFSET_VERSION: u16 = 0x200;

/// A decoded NTP3 texture file.
#[derive(Debug, Clone, PartialEq)]
pub struct Nut {
    pub version: u16,
    pub textures: Vec<NutTexture>,
}

impl Default for Nut {
    fn default() -> Self {
        Self {
            version: DATA_OFFSET_VERSION,
            textures: Vec::new(),
        }
    }
}

impl Nut {
    /// Check if data starts with the NTP3 magic.
    pub fn is_nut(data: &[u8]) -> bool {
        data.starts_with(NUT_MAGIC)
    }

    /// Parse an NTP3 file.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let magic = reader.read_array::<4>()?;
        if &magic != NUT_MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let version = reader.read_u16()?;
        let count = reader.read_u16()?;
        reader.skip(8)?;

        let mut textures = Vec::with_capacity(count as usize);
        for _ in 0..count {
            textures.push(read_texture(&mut reader, version)?);
        }

        Ok(Self { version, textures })
    }

    /// Serialize to NTP3 bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let count = u16::try_from(self.textures.len()).map_err(|_| Error::Overflow {
            what: "texture count",
            value: self.textures.len(),
        })?;

        let mut out = BinaryWriter::new();
        out.write_bytes(NUT_MAGIC);
        out.write_u16(self.version);
        out.write_u16(count);
        out.write_zeros(8);

        for texture in &self.textures {
            write_texture(&mut out, texture, self.version)?;
        }

        Ok(out.into_bytes())
    }
}

fn read_texture(reader: &mut BinaryReader<'_>, version: u16) -> Result<NutTexture> {
    let _total_size = reader.read_u32()?;
    reader.skip(4)?;
    let data_size = reader.read_u32()? as usize;
    let _header_size = reader.read_u16()?;
    reader.skip(2)?;

    let unk0 = reader.read_u8()?;
    let mipmap_count = reader.read_u8()?;
    let unk1 = reader.read_u8()?;
    let pixel_format = reader.read_u8()?;
    let width = reader.read_u16()?;
    let height = reader.read_u16()?;
    let unk2 = reader.read_u32()?;
    let cubemap_format = reader.read_u32()?;

    let raw_offsets = reader.read_u32_vec(4)?;
    let offsets = if version < DATA_OFFSET_VERSION {
        [0; 4]
    } else {
        [raw_offsets[0], raw_offsets[1], raw_offsets[2], raw_offsets[3]]
    };

    let mut texture = NutTexture {
        unk0,
        mipmap_count,
        unk1,
        pixel_format,
        width,
        height,
        unk2,
        cubemap_format,
        offsets,
        ..Default::default()
    };

    if texture.is_cubemap() {
        let sizes = reader.read_u32_vec(4)?;
        texture.cubemap_sizes = [sizes[0], sizes[1], sizes[2], sizes[3]];
    }

    if mipmap_count > 1 {
        texture.mipmap_sizes = reader.read_u32_vec(mipmap_count as usize)?;
        reader.align(0x10)?;
    }

    texture.ext = reader.read_array::<0x18>()?;
    texture.hash_id = reader.read_u32()?;
    reader.skip(4)?;

    texture.data = reader.read_bytes(data_size)?.to_vec();

    let total: usize = texture.mipmap_sizes.iter().map(|&s| s as usize).sum();
    if !texture.is_cubemap() && total > data_size {
        return Err(Error::MipmapSizeMismatch {
            expected: total,
            actual: data_size,
        });
    }

    Ok(texture)
}

fn write_texture(out: &mut BinaryWriter, texture: &NutTexture, version: u16) -> Result<()> {
    if texture.mipmap_count > 1 && texture.mipmap_sizes.len() != texture.mipmap_count as usize {
        return Err(Error::MipmapCountMismatch {
            count: texture.mipmap_count,
            sizes: texture.mipmap_sizes.len(),
        });
    }
    let data_size = u32::try_from(texture.data.len()).map_err(|_| Error::Overflow {
        what: "texture data size",
        value: texture.data.len(),
    })?;

    let start = out.position();
    out.write_u32(0); // total size, patched below
    out.write_u32(0);
    out.write_u32(data_size);
    out.write_u16(0); // header size, patched below
    out.write_u16(0);

    out.write_u8(texture.unk0);
    out.write_u8(texture.mipmap_count);
    out.write_u8(texture.unk1);
    out.write_u8(texture.pixel_format);
    out.write_u16(texture.width);
    out.write_u16(texture.height);
    out.write_u32(texture.unk2);
    out.write_u32(texture.cubemap_format);

    let offsets_at = out.position();
    if version < DATA_OFFSET_VERSION {
        out.write_zeros(16);
    } else {
        out.write_u32_slice(&texture.offsets);
    }

    if texture.is_cubemap() {
        out.write_u32_slice(&texture.cubemap_sizes);
    }

    if texture.mipmap_count > 1 {
        out.write_u32_slice(&texture.mipmap_sizes);
        out.align(0x10);
    }

    out.write_bytes(&texture.ext);
    out.write_u32(texture.hash_id);
    out.write_u32(0);

    let header_size = out.position() - start;
    let header_size_u16 = u16::try_from(header_size).map_err(|_| Error::Overflow {
        what: "texture header size",
        value: header_size,
    })?;

    out.write_bytes(&texture.data);

    out.patch_u32(start, header_size as u32 + data_size);
    out.patch_u16(start + 12, header_size_u16);
    if version >= DATA_OFFSET_VERSION {
        out.patch_u32(offsets_at, header_size as u32);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PixelFormat, CUBEMAP_FLAG};

    const FILE_HEADER_SIZE: usize = 0x10;

    fn mipmapped() -> NutTexture {
        NutTexture {
            mipmap_count: 3,
            pixel_format: PixelFormat::Dxt5 as u8,
            width: 8,
            height: 8,
            mipmap_sizes: vec![64, 16, 16],
            data: (0..96).map(|i| i as u8).collect(),
            hash_id: 0x4000_0001,
            ..Default::default()
        }
    }

    #[test]
    fn test_write_then_parse() {
        let mut texture = mipmapped();
        let nut = Nut {
            version: 0x200,
            textures: vec![texture.clone()],
        };

        let bytes = nut.to_bytes().unwrap();
        assert!(Nut::is_nut(&bytes));

        let parsed = Nut::parse(&bytes).unwrap();
        // The data offset word is recomputed from the header layout.
        texture.offsets[0] = parsed.textures[0].offsets[0];
        assert_eq!(parsed.version, 0x200);
        assert_eq!(parsed.textures, vec![texture]);
        assert_eq!(parsed.textures[0].pixel_format_name(), Some("DXT5"));
        assert_eq!(parsed.textures[0].mipmaps().unwrap().len(), 3);
    }

    #[test]
    fn test_header_size_and_data_offset() {
        let nut = Nut {
            version: 0x200,
            textures: vec![mipmapped()],
        };
        let bytes = nut.to_bytes().unwrap();
        let mut reader = BinaryReader::new_at(&bytes, FILE_HEADER_SIZE);

        let total = reader.read_u32().unwrap();
        reader.skip(4).unwrap();
        let data_size = reader.read_u32().unwrap();
        let header_size = reader.read_u16().unwrap() as u32;
        assert_eq!(data_size, 96);
        assert_eq!(total, header_size + data_size);
        // 0x30 fixed, 12 bytes of sizes padded to the next 16, 0x18 + 8 trailer.
        assert_eq!(header_size, 0x30 + 0x10 + 0x20);

        reader.seek(FILE_HEADER_SIZE + 0x20).unwrap();
        assert_eq!(reader.read_u32().unwrap(), header_size);
    }

    #[test]
    fn test_old_version_cubemap() {
        let texture = NutTexture {
            pixel_format: PixelFormat::Rgba8 as u8,
            cubemap_format: CUBEMAP_FLAG,
            cubemap_sizes: [4, 4, 0, 0],
            data: vec![1; 24],
            ..Default::default()
        };
        let nut = Nut {
            version: 0x100,
            textures: vec![texture.clone()],
        };

        let parsed = Nut::parse(&nut.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.textures, vec![texture]);
        assert_eq!(parsed.textures[0].cubemap_faces().unwrap().len(), 6);
    }

    #[test]
    fn test_invalid_magic() {
        assert!(matches!(
            Nut::parse(b"NDP3\0\0\0\0\0\0\0\0\0\0\0\0"),
            Err(Error::InvalidMagic(_))
        ));
    }

    #[test]
    fn test_mipmap_count_mismatch() {
        let mut texture = mipmapped();
        texture.mipmap_sizes.pop();
        let nut = Nut {
            version: 0x200,
            textures: vec![texture],
        };
        assert!(matches!(
            nut.to_bytes(),
            Err(Error::MipmapCountMismatch { count: 3, sizes: 2 })
        ));
    }
}
