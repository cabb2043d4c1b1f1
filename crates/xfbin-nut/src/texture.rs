//! Texture entries and pixel formats.

/// Cubemap bit in a texture's cubemap format field.
pub const CUBEMAP_FLAG: u32 = 0x200;

/// Number of faces stored for a cubemap.
pub const CUBEMAP_FACES: usize = 6;

/// Known NTP3 pixel formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PixelFormat {
    Dxt1 = 0,
    Dxt3 = 1,
    Dxt5 = 2,
    Rgb5A1 = 6,
    Rgba4 = 7,
    Rgb565 = 8,
    Rgbx8 = 14,
    Rgba8 = 17,
}

impl PixelFormat {
    pub fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Dxt1,
            1 => Self::Dxt3,
            2 => Self::Dxt5,
            6 => Self::Rgb5A1,
            7 => Self::Rgba4,
            8 => Self::Rgb565,
            14 => Self::Rgbx8,
            17 => Self::Rgba8,
            _ => return None,
        })
    }

    /// Display name used by the game's tooling.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dxt1 => "DXT1",
            Self::Dxt3 => "DXT3",
            Self::Dxt5 => "DXT5",
            Self::Rgb5A1 => "5.5.5.1",
            Self::Rgba4 => "4.4.4.4",
            Self::Rgb565 => "5.6.5",
            Self::Rgbx8 => "8.8.8.X",
            Self::Rgba8 => "8.8.8.8",
        }
    }

    pub fn is_compressed(self) -> bool {
        matches!(self, Self::Dxt1 | Self::Dxt3 | Self::Dxt5)
    }
}

/// The `eXt` / `GIDX` trailer every texture header carries.
pub const DEFAULT_EXT_BLOCK: [u8; 0x18] = [
    b'e', b'X', b't', 0, 0, 0, 0, 0x20, 0, 0, 0, 0x10, 0, 0, 0, 0, //
    b'G', b'I', b'D', b'X', 0, 0, 0, 0x10,
];

/// One texture inside an NTP3 file.
#[derive(Debug, Clone, PartialEq)]
pub struct NutTexture {
    pub unk0: u8,
    pub mipmap_count: u8,
    pub unk1: u8,
    /// Raw pixel format; see [`PixelFormat`].
    pub pixel_format: u8,
    pub width: u16,
    pub height: u16,
    pub unk2: u32,
    pub cubemap_format: u32,
    /// Offset words. From version 0x200 the first is the data offset and is
    /// recomputed on write.
    pub offsets: [u32; 4],
    /// Face size words, present only for cubemaps.
    pub cubemap_sizes: [u32; 4],
    /// Per-level sizes, present only when `mipmap_count > 1`.
    pub mipmap_sizes: Vec<u32>,
    pub ext: [u8; 0x18],
    pub hash_id: u32,
    pub data: Vec<u8>,
}

impl Default for NutTexture {
    fn default() -> Self {
        Self {
            unk0: 0,
            mipmap_count: 1,
            unk1: 0,
            pixel_format: 0,
            width: 0,
            height: 0,
            unk2: 0,
            cubemap_format: 0,
            offsets: [0; 4],
            cubemap_sizes: [0; 4],
            mipmap_sizes: Vec::new(),
            ext: DEFAULT_EXT_BLOCK,
            hash_id: 0,
            data: Vec::new(),
        }
    }
}

impl NutTexture {
    pub fn is_cubemap(&self) -> bool {
        self.cubemap_format & CUBEMAP_FLAG != 0
    }

    pub fn format(&self) -> Option<PixelFormat> {
        PixelFormat::from_raw(self.pixel_format)
    }

    pub fn pixel_format_name(&self) -> Option<&'static str> {
        self.format().map(PixelFormat::name)
    }

    /// Split the data into mipmap levels, largest first.
    ///
    /// Returns `None` for cubemaps, which store faces instead of a mip chain.
    /// A single-level texture yields the whole data block.
    pub fn mipmaps(&self) -> Option<Vec<&[u8]>> {
        if self.is_cubemap() {
            return None;
        }
        if self.mipmap_count <= 1 || self.mipmap_sizes.is_empty() {
            return Some(vec![&self.data]);
        }

        let mut levels = Vec::with_capacity(self.mipmap_sizes.len());
        let mut rest = self.data.as_slice();
        for &size in &self.mipmap_sizes {
            let size = (size as usize).min(rest.len());
            let (level, tail) = rest.split_at(size);
            levels.push(level);
            rest = tail;
        }
        Some(levels)
    }

    /// Split the data into its six cubemap faces.
    pub fn cubemap_faces(&self) -> Option<Vec<&[u8]>> {
        if !self.is_cubemap() {
            return None;
        }
        let stored = self.cubemap_sizes[0] as usize;
        let face_size = if stored > 0 && stored * CUBEMAP_FACES <= self.data.len() {
            stored
        } else {
            self.data.len() / CUBEMAP_FACES
        };
        if face_size == 0 {
            return Some(Vec::new());
        }
        Some(
            self.data
                .chunks_exact(face_size)
                .take(CUBEMAP_FACES)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_names() {
        assert_eq!(PixelFormat::from_raw(2).map(PixelFormat::name), Some("DXT5"));
        assert_eq!(PixelFormat::from_raw(14).map(PixelFormat::name), Some("8.8.8.X"));
        assert!(PixelFormat::from_raw(3).is_none());
        assert!(PixelFormat::Dxt1.is_compressed());
        assert!(!PixelFormat::Rgba8.is_compressed());
    }

    #[test]
    fn test_mipmap_split() {
        let texture = NutTexture {
            mipmap_count: 3,
            mipmap_sizes: vec![16, 4, 1],
            data: (0..21).collect(),
            ..Default::default()
        };
        let levels = texture.mipmaps().unwrap();
        assert_eq!(levels.iter().map(|l| l.len()).collect::<Vec<_>>(), vec![16, 4, 1]);
        assert_eq!(levels[2], &[20]);
        assert!(texture.cubemap_faces().is_none());
    }

    #[test]
    fn test_cubemap_faces() {
        let texture = NutTexture {
            cubemap_format: CUBEMAP_FLAG,
            cubemap_sizes: [8, 8, 0, 0],
            data: vec![0xAB; 48],
            ..Default::default()
        };
        let faces = texture.cubemap_faces().unwrap();
        assert_eq!(faces.len(), CUBEMAP_FACES);
        assert!(faces.iter().all(|f| f.len() == 8));
        assert!(texture.mipmaps().is_none());
    }
}
