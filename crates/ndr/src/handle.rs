//! RPC context handles
//!
//! A context handle is a 20-byte token the server hands out from an open
//! call and expects back, bit for bit, on every call against the same
//! server-side object. A zeroed handle is never valid on the wire; clients
//! zero their copy after a successful close so stale use is caught locally.

use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result, Uuid};

/// Wire size of a context handle
pub const CONTEXT_HANDLE_SIZE: usize = 20;

/// `[context_handle]` value: attributes word plus object UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContextHandle {
    pub attributes: u32,
    pub uuid: Uuid,
}

impl ContextHandle {
    pub const NIL: Self = Self {
        attributes: 0,
        uuid: Uuid::NIL,
    };

    pub fn new(attributes: u32, uuid: Uuid) -> Self {
        Self { attributes, uuid }
    }

    /// True for the all-zero handle (never opened, or closed)
    pub fn is_nil(&self) -> bool {
        self.attributes == 0 && self.uuid.is_nil()
    }

    /// Zero the handle after the server-side object has been released
    pub fn invalidate(&mut self) {
        *self = Self::NIL;
    }

    /// Raw wire bytes
    pub fn to_bytes(&self) -> [u8; CONTEXT_HANDLE_SIZE] {
        let mut out = [0u8; CONTEXT_HANDLE_SIZE];
        out[..4].copy_from_slice(&self.attributes.to_le_bytes());
        out[4..8].copy_from_slice(&self.uuid.data1.to_le_bytes());
        out[8..10].copy_from_slice(&self.uuid.data2.to_le_bytes());
        out[10..12].copy_from_slice(&self.uuid.data3.to_le_bytes());
        out[12..].copy_from_slice(&self.uuid.data4);
        out
    }
}

impl std::fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}:{}", self.attributes, self.uuid)
    }
}

impl NdrEncode for ContextHandle {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_u32(self.attributes);
        self.uuid.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for ContextHandle {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.attributes = r.read_u32()?;
        self.uuid.ndr_decode(r)
    }

    fn ndr_min_size() -> usize {
        CONTEXT_HANDLE_SIZE
    }
}
