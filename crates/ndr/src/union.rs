//! NDR discriminated unions
//!
//! A union is written as its selector, padding to the alignment of the widest
//! arm, then the body of the arm the selector names. Arms are chosen by
//! selector value, not by the Rust variant alone, so a binding can map several
//! selector values to one arm and keep an opaque default arm for the rest.

use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

/// Wire width of a union selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchWidth {
    U16,
    U32,
}

impl SwitchWidth {
    pub const fn alignment(self) -> usize {
        match self {
            SwitchWidth::U16 => 2,
            SwitchWidth::U32 => 4,
        }
    }
}

/// A discriminated union body
///
/// Implementations must cover every selector: values with no named arm go to
/// a default arm (usually [`RawArm`]). `encode_arm` returns
/// [`NdrError::SwitchMismatch`](crate::NdrError::SwitchMismatch) when the
/// selector does not name the variant held, and `decode_arm` returns
/// [`NdrError::UnsupportedSwitchValue`](crate::NdrError::UnsupportedSwitchValue)
/// if a selector is somehow left unhandled.
pub trait NdrUnion: Default {
    const SWITCH: SwitchWidth;

    /// Alignment of the most strictly aligned arm
    const ARM_ALIGN: usize;

    /// Selector that names the arm currently held
    fn selector(&self) -> u32;

    fn encode_arm<'a>(&'a self, selector: u32, w: &mut NdrWriter<'a>) -> Result<()>;

    fn decode_arm<'a>(&'a mut self, selector: u32, r: &mut NdrReader<'a>) -> Result<()>;
}

/// Encapsulated union: the selector travels with the arm
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Switched<U> {
    pub selector: u32,
    pub value: U,
}

impl<U: NdrUnion> Switched<U> {
    /// Wrap `value` using the selector it reports for itself
    pub fn new(value: U) -> Self {
        Self {
            selector: value.selector(),
            value,
        }
    }

    /// Wrap `value` under an explicit selector, for arms reachable from more
    /// than one selector value
    pub fn with_selector(selector: u32, value: U) -> Self {
        Self { selector, value }
    }
}

impl<U: NdrUnion> NdrEncode for Switched<U> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_union(self.selector, &self.value)
    }

    fn ndr_align() -> usize {
        U::SWITCH.alignment().max(U::ARM_ALIGN)
    }
}

impl<U: NdrUnion> NdrDecode for Switched<U> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.selector = r.read_union(&mut self.value)?;
        Ok(())
    }

    fn ndr_min_size() -> usize {
        U::SWITCH.alignment()
    }
}

/// Opaque default arm: a conformant byte blob
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArm {
    pub data: Vec<u8>,
}

impl RawArm {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

impl NdrEncode for RawArm {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_conformant(self.data.len(), &self.data)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for RawArm {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_conformant(&mut self.data)?;
        Ok(())
    }

    fn ndr_min_size() -> usize {
        4
    }
}
