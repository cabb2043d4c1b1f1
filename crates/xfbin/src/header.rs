//! The fixed file header.

use xfbin_common::BinaryReader;
use zerocopy::byteorder::big_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{Error, Result};

/// XFBIN file magic.
pub const XFBIN_MAGIC: &[u8; 4] = b"NUCC";

/// Magic of a CPK archive, which is what users often pass by mistake.
pub const CPK_MAGIC: &[u8; 4] = b"CPK ";

/// Wire layout of the 28-byte header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub(crate) struct RawHeader {
    pub magic: [u8; 4],
    pub id: U32,
    pub reserved: [u8; 8],
    /// Chunk table size, not counting the reference section.
    pub chunk_table_size: U32,
    pub min_page_size: U32,
    pub id2: U16,
    pub unk: U16,
}

impl RawHeader {
    pub const SIZE: usize = 0x1C;
}

/// Header fields that survive a decode and are written back on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XfbinHeader {
    pub id: u32,
    pub min_page_size: u32,
    pub id2: u16,
    pub unk: u16,
}

impl Default for XfbinHeader {
    fn default() -> Self {
        Self {
            id: 0x79,
            min_page_size: 3,
            id2: 0x79,
            unk: 0,
        }
    }
}

impl XfbinHeader {
    /// Read and validate the header.
    pub(crate) fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let magic = reader.peek_bytes(4)?;
        if magic == CPK_MAGIC {
            return Err(Error::CpkCompressed);
        }

        let raw: RawHeader = reader.read_struct()?;
        if &raw.magic != XFBIN_MAGIC {
            return Err(Error::InvalidMagic(raw.magic));
        }

        Ok(Self {
            id: raw.id.get(),
            min_page_size: raw.min_page_size.get(),
            id2: raw.id2.get(),
            unk: raw.unk.get(),
        })
    }

    pub(crate) fn to_raw(self, chunk_table_size: u32) -> RawHeader {
        RawHeader {
            magic: *XFBIN_MAGIC,
            id: U32::new(self.id),
            reserved: [0; 8],
            chunk_table_size: U32::new(chunk_table_size),
            min_page_size: U32::new(self.min_page_size),
            id2: U16::new(self.id2),
            unk: U16::new(self.unk),
        }
    }
}
