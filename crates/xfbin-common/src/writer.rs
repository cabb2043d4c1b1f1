//! Binary writer producing big-endian output.

use byteorder::{BigEndian, ByteOrder};
use half::f16;

use crate::reader::padding_for;

/// A growable big-endian byte buffer.
///
/// The writer never fails; range checks on the values themselves belong to
/// the caller, which knows which field overflowed.
#[derive(Debug, Clone, Default)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

macro_rules! write_be {
    ($($name:ident, $slice:ident => $ty:ty, $size:expr, $conv:expr;)*) => {
        $(
            #[inline]
            pub fn $name(&mut self, value: $ty) {
                let mut bytes = [0u8; $size];
                $conv(&mut bytes, value);
                self.buf.extend_from_slice(&bytes);
            }

            pub fn $slice(&mut self, values: &[$ty]) {
                for &value in values {
                    self.$name(value);
                }
            }
        )*
    };
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Current length of the output, which is also the write position.
    #[inline]
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_zeros(&mut self, count: usize) {
        self.buf.resize(self.buf.len() + count, 0);
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    #[inline]
    pub fn write_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    write_be! {
        write_u16, write_u16_slice => u16, 2, BigEndian::write_u16;
        write_i16, write_i16_slice => i16, 2, BigEndian::write_i16;
        write_u32, write_u32_slice => u32, 4, BigEndian::write_u32;
        write_i32, write_i32_slice => i32, 4, BigEndian::write_i32;
        write_u64, write_u64_slice => u64, 8, BigEndian::write_u64;
        write_f32, write_f32_slice => f32, 4, BigEndian::write_f32;
    }

    /// Write an f32 narrowed to an IEEE-754 half float.
    pub fn write_f16(&mut self, value: f32) {
        self.write_u16(f16::from_f32(value).to_bits());
    }

    pub fn write_f16_slice(&mut self, values: &[f32]) {
        for &value in values {
            self.write_f16(value);
        }
    }

    /// Write a string followed by a null terminator.
    pub fn write_cstring(&mut self, value: &str) {
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.push(0);
    }

    /// Pad with zeros up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) {
        self.write_zeros(padding_for(self.buf.len(), alignment));
    }

    /// Overwrite a previously written u32 at `offset`.
    ///
    /// Offsets past the end are ignored; callers patch only placeholders
    /// they wrote themselves.
    pub fn patch_u32(&mut self, offset: usize, value: u32) {
        if let Some(slot) = self.buf.get_mut(offset..offset + 4) {
            BigEndian::write_u32(slot, value);
        }
    }

    /// Overwrite a previously written u16 at `offset`.
    pub fn patch_u16(&mut self, offset: usize, value: u16) {
        if let Some(slot) = self.buf.get_mut(offset..offset + 2) {
            BigEndian::write_u16(slot, value);
        }
    }
}
