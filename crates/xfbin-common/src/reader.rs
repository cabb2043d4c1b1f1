//! Binary reader for big-endian parsing of byte slices.
//!
//! This module provides [`BinaryReader`], a cursor-like type that reads
//! big-endian values from a byte slice without copying.

use byteorder::{BigEndian, ByteOrder};
use half::f16;
use zerocopy::FromBytes;

use crate::{Error, Result};

/// A big-endian binary reader over a byte slice.
///
/// Every read is bounds-checked. Running past the end of the buffer yields
/// [`Error::UnexpectedEof`] with the offset where the read started.
///
/// # Example
///
/// ```
/// use xfbin_common::BinaryReader;
///
/// let data = [0x00, 0x00, 0x00, 0x79, 0xFF, 0xFF];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x79);
/// assert_eq!(reader.read_i16().unwrap(), -1);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

macro_rules! read_be {
    ($(#[$doc:meta] $name:ident, $array:ident => $ty:ty, $size:expr, $conv:expr;)*) => {
        $(
            #[$doc]
            #[inline]
            pub fn $name(&mut self) -> Result<$ty> {
                let bytes = self.read_bytes($size)?;
                Ok($conv(bytes))
            }

            /// Read `count` consecutive values of this type.
            pub fn $array(&mut self, count: usize) -> Result<Vec<$ty>> {
                let bytes = self.read_bytes(count.saturating_mul($size))?;
                Ok(bytes.chunks_exact($size).map($conv).collect())
            }
        )*
    };
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Create a new reader starting at a specific position.
    #[inline]
    pub const fn new_at(data: &'a [u8], position: usize) -> Self {
        Self { data, position }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// The whole underlying buffer, independent of the current position.
    #[inline]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Seek to an absolute position.
    ///
    /// Seeking to exactly the end of the buffer is allowed.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::SeekOutOfBounds {
                position,
                len: self.data.len(),
            });
        }
        self.position = position;
        Ok(())
    }

    /// Move the position by a signed offset.
    pub fn seek_relative(&mut self, offset: isize) -> Result<()> {
        let target = self.position.checked_add_signed(offset).ok_or(Error::SeekOutOfBounds {
            position: self.position,
            len: self.data.len(),
        })?;
        self.seek(target)
    }

    /// Skip `count` bytes.
    #[inline]
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    /// Advance the position up to the next multiple of `alignment`.
    ///
    /// Alignment is measured from the start of the buffer.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = padding_for(self.position, alignment);
        if padding > 0 {
            self.skip(padding.min(self.remaining()))?;
        }
        Ok(())
    }

    /// Run `f` with the cursor moved to `position`, then restore the
    /// original position whether `f` succeeded or not.
    pub fn with_seek<T, E, F>(&mut self, position: usize, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let saved = self.position;
        self.seek(position)?;
        let result = f(self);
        self.position = saved;
        result
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                offset: self.position,
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a fixed-size byte array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a signed byte.
    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    /// Read `count` signed bytes.
    pub fn read_i8_vec(&mut self, count: usize) -> Result<Vec<i8>> {
        Ok(self.read_bytes(count)?.iter().map(|&b| b as i8).collect())
    }

    read_be! {
        /// Read a big-endian u16.
        read_u16, read_u16_vec => u16, 2, BigEndian::read_u16;
        /// Read a big-endian i16.
        read_i16, read_i16_vec => i16, 2, BigEndian::read_i16;
        /// Read a big-endian u32.
        read_u32, read_u32_vec => u32, 4, BigEndian::read_u32;
        /// Read a big-endian i32.
        read_i32, read_i32_vec => i32, 4, BigEndian::read_i32;
        /// Read a big-endian u64.
        read_u64, read_u64_vec => u64, 8, BigEndian::read_u64;
        /// Read a big-endian i64.
        read_i64, read_i64_vec => i64, 8, BigEndian::read_i64;
        /// Read a big-endian IEEE-754 f32.
        read_f32, read_f32_vec => f32, 4, BigEndian::read_f32;
        /// Read a big-endian IEEE-754 half float, widened to f32.
        read_f16, read_f16_vec => f32, 2, |b: &[u8]| f16::from_bits(BigEndian::read_u16(b)).to_f32();
    }

    /// Read exactly `N` big-endian f32 values.
    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N]> {
        let mut out = [0.0f32; N];
        for value in &mut out {
            *value = self.read_f32()?;
        }
        Ok(out)
    }

    /// Read a fixed-layout structure.
    ///
    /// Use the `zerocopy::byteorder::big_endian` field types so the layout
    /// matches the wire without any per-field conversion.
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let offset = self.position;
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            offset,
            needed: size,
            available: bytes.len(),
        })
    }

    /// Read a null-terminated UTF-8 string.
    pub fn read_cstring(&mut self) -> Result<&'a str> {
        let start = self.position;
        let remaining = self.remaining_bytes();

        let null_pos = memchr::memchr(0, remaining)
            .ok_or(Error::MissingNullTerminator { offset: start })?;

        let string_bytes = &remaining[..null_pos];
        self.position = start + null_pos + 1;

        std::str::from_utf8(string_bytes).map_err(|source| Error::Utf8 {
            offset: start,
            source,
        })
    }

    /// Read a string of a specific length.
    pub fn read_string(&mut self, length: usize) -> Result<&'a str> {
        let offset = self.position;
        let bytes = self.read_bytes(length)?;
        std::str::from_utf8(bytes).map_err(|source| Error::Utf8 { offset, source })
    }

    /// Peek at a u32 without advancing.
    #[inline]
    pub fn peek_u32(&self) -> Result<u32> {
        self.peek_bytes(4).map(BigEndian::read_u32)
    }

    /// Expect specific magic bytes.
    pub fn expect_magic(&mut self, expected: &[u8]) -> Result<()> {
        let offset = self.position;
        let actual = self.read_bytes(expected.len())?;
        if actual != expected {
            return Err(Error::InvalidMagic {
                offset,
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            });
        }
        Ok(())
    }

    /// Find the first occurrence of `needle` at or after the current
    /// position, returning its absolute offset.
    pub fn find(&self, needle: &[u8]) -> Option<usize> {
        memchr::memmem::find(self.remaining_bytes(), needle).map(|pos| pos + self.position)
    }
}

/// Number of zero bytes needed to bring `position` up to `alignment`.
#[inline]
pub fn padding_for(position: usize, alignment: usize) -> usize {
    if alignment == 0 {
        return 0;
    }
    (alignment - position % alignment) % alignment
}
