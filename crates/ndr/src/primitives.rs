//! NDR primitive type implementations
//!
//! | IDL type       | Rust type | Size | Alignment |
//! |----------------|-----------|------|-----------|
//! | boolean        | bool      | 1    | 1         |
//! | byte/char      | u8        | 1    | 1         |
//! | small          | i8        | 1    | 1         |
//! | short          | i16       | 2    | 2         |
//! | unsigned short | u16       | 2    | 2         |
//! | long           | i32       | 4    | 4         |
//! | unsigned long  | u32       | 4    | 4         |
//! | hyper          | i64       | 8    | 8         |
//! | unsigned hyper | u64       | 8    | 8         |
//! | float          | f32       | 4    | 4         |
//! | double         | f64       | 8    | 8         |
//! | GUID           | Uuid      | 16   | 4         |

use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

macro_rules! impl_ndr_primitive {
    ($ty:ty, $size:expr, $write:ident, $read:ident) => {
        impl NdrEncode for $ty {
            fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
                w.$write(*self);
                Ok(())
            }

            fn ndr_align() -> usize {
                $size
            }
        }

        impl NdrDecode for $ty {
            fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
                *self = r.$read()?;
                Ok(())
            }

            fn ndr_min_size() -> usize {
                $size
            }
        }
    };
}

impl_ndr_primitive!(u8, 1, write_u8, read_u8);
impl_ndr_primitive!(i8, 1, write_i8, read_i8);
impl_ndr_primitive!(u16, 2, write_u16, read_u16);
impl_ndr_primitive!(i16, 2, write_i16, read_i16);
impl_ndr_primitive!(u32, 4, write_u32, read_u32);
impl_ndr_primitive!(i32, 4, write_i32, read_i32);
impl_ndr_primitive!(u64, 8, write_u64, read_u64);
impl_ndr_primitive!(i64, 8, write_i64, read_i64);
impl_ndr_primitive!(f32, 4, write_f32, read_f32);
impl_ndr_primitive!(f64, 8, write_f64, read_f64);

/// NDR boolean - a single byte, nonzero is true
impl NdrEncode for bool {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_u8(u8::from(*self));
        Ok(())
    }
}

impl NdrDecode for bool {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        *self = r.read_u8()? != 0;
        Ok(())
    }
}

/// GUID in its NDR layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Uuid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Uuid {
    /// Nil UUID
    pub const NIL: Self = Self {
        data1: 0,
        data2: 0,
        data3: 0,
        data4: [0; 8],
    };

    /// Parse from string "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() != 36 {
            return None;
        }
        let parts: Vec<&str> = s.split('-').collect();
        let well_formed = parts.len() == 5
            && parts.iter().zip([8, 4, 4, 4, 12]).all(|(part, len)| part.len() == len)
            && parts.iter().all(|part| part.bytes().all(|b| b.is_ascii_hexdigit()));
        if !well_formed {
            return None;
        }

        let data1 = u32::from_str_radix(parts[0], 16).ok()?;
        let data2 = u16::from_str_radix(parts[1], 16).ok()?;
        let data3 = u16::from_str_radix(parts[2], 16).ok()?;
        let clock = u16::from_str_radix(parts[3], 16).ok()?;

        let mut data4 = [0u8; 8];
        data4[..2].copy_from_slice(&clock.to_be_bytes());
        for (i, byte) in data4[2..].iter_mut().enumerate() {
            *byte = u8::from_str_radix(parts[4].get(i * 2..i * 2 + 2)?, 16).ok()?;
        }

        Some(Self { data1, data2, data3, data4 })
    }

    /// Build from the 16 bytes of its little-endian wire form
    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        let mut data4 = [0u8; 8];
        data4.copy_from_slice(&bytes[8..]);
        Self {
            data1: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data2: u16::from_le_bytes([bytes[4], bytes[5]]),
            data3: u16::from_le_bytes([bytes[6], bytes[7]]),
            data4,
        }
    }

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }
}

impl std::fmt::Display for Uuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.data1,
            self.data2,
            self.data3,
            self.data4[0],
            self.data4[1],
            self.data4[2],
            self.data4[3],
            self.data4[4],
            self.data4[5],
            self.data4[6],
            self.data4[7],
        )
    }
}

impl NdrEncode for Uuid {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_u32(self.data1);
        w.write_u16(self.data2);
        w.write_u16(self.data3);
        w.write_bytes(&self.data4);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Uuid {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.data1 = r.read_u32()?;
        self.data2 = r.read_u16()?;
        self.data3 = r.read_u16()?;
        self.data4.copy_from_slice(&r.read_bytes(8)?);
        Ok(())
    }

    fn ndr_min_size() -> usize {
        16
    }
}
