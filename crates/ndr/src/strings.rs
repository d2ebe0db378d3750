//! NDR string types
//!
//! `[string]` pointees are conformant varying arrays that include a NUL
//! terminator:
//!
//! ```text
//! max_count: u32    # Elements including NUL
//! offset: u32       # Always 0
//! actual_count: u32 # Elements including NUL
//! chars[actual_count]
//! ```
//!
//! Counted strings carry their lengths in the enclosing structure instead and
//! point at a `size_is(MaximumLength) length_is(Length)` buffer with no
//! terminator. Lengths are in bytes for both the 8-bit and the UTF-16 form.

use crate::normalize::Normalize;
use crate::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

/// 8-bit NUL-terminated string (`[string] char*`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AString(pub String);

impl AString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for AString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl NdrEncode for AString {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        let bytes = self.0.as_bytes();
        let count = bytes.len() + 1;
        w.write_size(count)?;
        w.write_size(0)?;
        w.write_size(count)?;
        w.write_bytes(bytes);
        w.write_u8(0);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for AString {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        let max_count = r.read_size()?;
        let (_offset, actual) = r.read_variance(max_count)?;
        if actual == 0 {
            return Err(NdrError::InvalidString("missing NUL terminator".to_string()));
        }
        r.check_count(actual, 1)?;
        let raw = r.read_bytes(actual)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        self.0 = String::from_utf8(raw[..end].to_vec())?;
        Ok(())
    }

    fn ndr_min_size() -> usize {
        12
    }
}

/// UTF-16LE NUL-terminated string (`[string] wchar_t*`)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WString(pub String);

impl WString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for WString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl NdrEncode for WString {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        let units: Vec<u16> = self.0.encode_utf16().collect();
        let count = units.len() + 1;
        w.write_size(count)?;
        w.write_size(0)?;
        w.write_size(count)?;
        for unit in units {
            w.write_u16(unit);
        }
        w.write_u16(0);
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for WString {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        let max_count = r.read_size()?;
        let (_offset, actual) = r.read_variance(max_count)?;
        if actual == 0 {
            return Err(NdrError::InvalidString("missing NUL terminator".to_string()));
        }
        let units = read_utf16_units(r, actual)?;
        let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
        self.0 = utf16_to_string(&units[..end])?;
        Ok(())
    }

    fn ndr_min_size() -> usize {
        12
    }
}

/// Counted 8-bit string (`STRING`)
///
/// `length` and `maximum_length` are byte counts. A zero `maximum_length` is
/// treated as unset and encoded as the larger of `length` and the buffer
/// size; the value itself is never modified by encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CountedString {
    pub length: u16,
    pub maximum_length: u16,
    pub buffer: Vec<u8>,
}

impl CountedString {
    /// Build from bytes with both lengths set to the buffer size
    pub fn new(buffer: impl Into<Vec<u8>>) -> Self {
        let mut s = Self {
            length: 0,
            maximum_length: 0,
            buffer: buffer.into(),
        };
        s.normalize();
        s
    }

    /// `(Length, MaximumLength)` as they will appear on the wire
    pub fn wire_lengths(&self) -> Result<(u16, u16)> {
        let buffer_len = u16_count(self.buffer.len())?;
        let maximum_length = if self.maximum_length == 0 {
            self.length.max(buffer_len)
        } else {
            self.maximum_length
        };
        Ok((self.length, maximum_length))
    }

    /// Valid bytes, bounded by `length`
    pub fn as_bytes(&self) -> &[u8] {
        let end = (self.length as usize).min(self.buffer.len());
        &self.buffer[..end]
    }
}

impl NdrEncode for CountedString {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        let (length, maximum_length) = self.wire_lengths()?;
        w.write_align(4);
        w.write_u16(length);
        w.write_u16(maximum_length);
        if self.buffer.is_empty() && maximum_length == 0 {
            w.write_null_pointer();
            return Ok(());
        }
        let buffer = &self.buffer;
        w.write_pointer(move |w| {
            let max_count = maximum_length as usize;
            w.write_conformant_varying(max_count, length as usize, buffer)
        });
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for CountedString {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.length = r.read_u16()?;
        self.maximum_length = r.read_u16()?;
        self.buffer.clear();
        if r.read_pointer()?.is_some() {
            let buffer = &mut self.buffer;
            r.defer(move |r| {
                r.read_conformant_varying(buffer)?;
                Ok(())
            });
        }
        Ok(())
    }

    fn ndr_min_size() -> usize {
        8
    }
}

impl Normalize for CountedString {
    fn normalize(&mut self) {
        self.length = self.buffer.len().min(u16::MAX as usize) as u16;
        self.maximum_length = self.maximum_length.max(self.length);
    }
}

/// Counted UTF-16 string (`RPC_UNICODE_STRING`)
///
/// `length` and `maximum_length` are byte counts, twice the number of code
/// units. Unset `maximum_length` is handled as for [`CountedString`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnicodeString {
    pub length: u16,
    pub maximum_length: u16,
    pub buffer: Vec<u16>,
}

impl UnicodeString {
    /// Build from text with both lengths set to the encoded size
    pub fn new(s: &str) -> Self {
        let mut u = Self {
            length: 0,
            maximum_length: 0,
            buffer: s.encode_utf16().collect(),
        };
        u.normalize();
        u
    }

    /// `(Length, MaximumLength)` as they will appear on the wire
    pub fn wire_lengths(&self) -> Result<(u16, u16)> {
        let buffer_len = u16_count(self.buffer.len() * 2)?;
        let maximum_length = if self.maximum_length == 0 {
            self.length.max(buffer_len)
        } else {
            self.maximum_length
        };
        Ok((self.length, maximum_length))
    }

    /// Valid code units, bounded by `length`
    pub fn units(&self) -> &[u16] {
        let end = (self.length as usize / 2).min(self.buffer.len());
        &self.buffer[..end]
    }

    /// Decode the valid code units
    pub fn as_string(&self) -> Result<String> {
        utf16_to_string(self.units())
    }
}

impl From<&str> for UnicodeString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl NdrEncode for UnicodeString {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        let (length, maximum_length) = self.wire_lengths()?;
        w.write_align(4);
        w.write_u16(length);
        w.write_u16(maximum_length);
        if self.buffer.is_empty() && maximum_length == 0 {
            w.write_null_pointer();
            return Ok(());
        }
        let buffer = &self.buffer;
        w.write_pointer(move |w| {
            let max_count = maximum_length as usize / 2;
            w.write_conformant_varying(max_count, length as usize / 2, buffer)
        });
        Ok(())
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for UnicodeString {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_align(4)?;
        self.length = r.read_u16()?;
        self.maximum_length = r.read_u16()?;
        self.buffer.clear();
        if r.read_pointer()?.is_some() {
            let buffer = &mut self.buffer;
            r.defer(move |r| {
                let max_count = r.read_size()?;
                let (_offset, actual) = r.read_variance(max_count)?;
                *buffer = read_utf16_units(r, actual)?;
                Ok(())
            });
        }
        Ok(())
    }

    fn ndr_min_size() -> usize {
        8
    }
}

impl Normalize for UnicodeString {
    fn normalize(&mut self) {
        self.length = (self.buffer.len() * 2).min(u16::MAX as usize & !1) as u16;
        self.maximum_length = self.maximum_length.max(self.length);
    }
}

fn u16_count(count: usize) -> Result<u16> {
    u16::try_from(count).map_err(|_| NdrError::CountOverflow(count))
}

/// Read `count` UTF-16LE code units after bounding the count
fn read_utf16_units(r: &mut NdrReader<'_>, count: usize) -> Result<Vec<u16>> {
    r.check_count(count, 2)?;
    r.read_align(2)?;
    let raw = r.read_bytes(count * 2)?;
    Ok(raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

fn utf16_to_string(units: &[u16]) -> Result<String> {
    char::decode_utf16(units.iter().copied())
        .collect::<std::result::Result<String, _>>()
        .map_err(NdrError::from)
}
