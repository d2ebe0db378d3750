//! NDR reader
//!
//! [`NdrReader`] is the unmarshaling mirror of [`NdrWriter`](crate::NdrWriter).
//! Values decode in place into default-constructed storage, so a pointer
//! field can register a deferred body that fills its freshly allocated
//! pointee once the enclosing aggregate has been read.
//!
//! All input is treated as untrusted: every count that drives an allocation
//! passes through [`NdrReader::check_count`] first.

use crate::config::NdrConfig;
use crate::decode::NdrDecode;
use crate::union::{NdrUnion, SwitchWidth};
use crate::writer::{align_padding, check_alignment};
use crate::{NdrError, Result};
use bytes::Bytes;
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// Deferred pointee body, run after the enclosing aggregate is read
pub type DeferredRead<'a> = Box<dyn FnOnce(&mut NdrReader<'a>) -> Result<()> + 'a>;

/// Unmarshaling cursor over one NDR stream
pub struct NdrReader<'a> {
    buf: Bytes,
    pos: usize,
    deferred: Vec<DeferredRead<'a>>,
    seen_referents: HashSet<u32>,
    config: NdrConfig,
}

impl<'a> NdrReader<'a> {
    /// Create a reader with default settings
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self::with_config(buf, &NdrConfig::default())
    }

    /// Create a reader with the given settings
    pub fn with_config(buf: impl Into<Bytes>, config: &NdrConfig) -> Self {
        Self {
            buf: buf.into(),
            pos: 0,
            deferred: Vec::new(),
            seen_referents: HashSet::new(),
            config: config.clone(),
        }
    }

    /// Current offset from the start of the stub
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Settings this reader was created with
    pub fn config(&self) -> &NdrConfig {
        &self.config
    }

    /// Number of pointee bodies waiting for the next `read_deferred`
    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let have = self.remaining();
        if needed > have {
            return Err(NdrError::TruncatedInput { needed, have });
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&[u8]> {
        self.ensure(len)?;
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..self.pos])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Skip padding up to a multiple of `alignment`. The skipped bytes are not
    /// inspected.
    pub fn read_align(&mut self, alignment: usize) -> Result<()> {
        check_alignment(alignment)?;
        let padding = align_padding(self.pos, alignment);
        self.ensure(padding)?;
        self.pos += padding;
        Ok(())
    }

    /// Raw bytes, no alignment. Shares the underlying buffer.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len)?;
        let out = self.buf.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_align(2)?;
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_align(2)?;
        Ok(i16::from_le_bytes(self.take_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_align(4)?;
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_align(4)?;
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_align(8)?;
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_align(8)?;
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_align(4)?;
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_align(8)?;
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    /// Read a conformance or variance count (aligned 32-bit)
    pub fn read_size(&mut self) -> Result<usize> {
        Ok(self.read_u32()? as usize)
    }

    /// Read a union selector at its declared width
    pub fn read_switch(&mut self, width: SwitchWidth) -> Result<u32> {
        match width {
            SwitchWidth::U16 => Ok(self.read_u16()? as u32),
            SwitchWidth::U32 => self.read_u32(),
        }
    }

    /// Read a pointer's referent id. Returns `None` for a null pointer.
    ///
    /// A repeated id is legal NDR (aliasing) but is decoded as an independent
    /// copy of the pointee; the repeat is only logged.
    pub fn read_pointer(&mut self) -> Result<Option<u32>> {
        let referent_id = self.read_u32()?;
        if referent_id == 0 {
            return Ok(None);
        }
        if !self.seen_referents.insert(referent_id) {
            debug!("referent id {:#010x} repeated, decoding as a fresh copy", referent_id);
        }
        Ok(Some(referent_id))
    }

    /// Queue a pointee body to run at the matching position of the deferred
    /// stream
    pub fn defer<F>(&mut self, body: F)
    where
        F: FnOnce(&mut NdrReader<'a>) -> Result<()> + 'a,
    {
        self.deferred.push(Box::new(body));
    }

    /// Run queued pointee bodies level by level, in the same order the
    /// writer emitted them.
    pub fn read_deferred(&mut self) -> Result<()> {
        let mut level = 0usize;
        while !self.deferred.is_empty() {
            let pending = std::mem::take(&mut self.deferred);
            trace!("reading {} deferred referents at level {}", pending.len(), level);
            for body in pending {
                body(self)?;
            }
            level += 1;
        }
        Ok(())
    }

    /// Read one top-level parameter: the value followed by all of its
    /// deferred referents.
    pub fn read_param<T: NdrDecode>(&mut self, value: &'a mut T) -> Result<()> {
        value.ndr_decode(self)?;
        self.read_deferred()
    }

    /// Read a union: selector, padding to the widest arm, then the arm body
    /// for that selector. Returns the selector.
    pub fn read_union<U: NdrUnion>(&mut self, value: &'a mut U) -> Result<u32> {
        let selector = self.read_switch(U::SWITCH)?;
        self.read_align(U::ARM_ALIGN)?;
        value.decode_arm(selector, self)?;
        Ok(selector)
    }

    /// Reject `count` elements of at least `min_size` bytes each if they
    /// cannot fit in what is left of the buffer, or exceed the configured
    /// element ceiling. Must run before any allocation sized by `count`.
    pub fn check_count(&self, count: usize, min_size: usize) -> Result<()> {
        if count > self.config.max_elements {
            debug!("rejecting count {} above element limit {}", count, self.config.max_elements);
            return Err(NdrError::AllocationLimitExceeded {
                requested: count,
                limit: self.config.max_elements,
            });
        }
        let remaining = self.remaining();
        if min_size > 0 && count > remaining / min_size {
            debug!(
                "rejecting count {} of {}-byte elements with {} bytes remaining",
                count, min_size, remaining
            );
            return Err(NdrError::BufferOverflow {
                count,
                element_size: min_size,
                remaining,
            });
        }
        Ok(())
    }

    /// Read the `[Offset][ActualCount]` pair of a varying array, clamping
    /// `ActualCount` to `max_count`.
    pub fn read_variance(&mut self, max_count: usize) -> Result<(usize, usize)> {
        let offset = self.read_size()?;
        let actual = self.read_size()?;
        if actual > max_count {
            warn!("actual count {} exceeds maximum count {}, clamping", actual, max_count);
            return Ok((offset, max_count));
        }
        Ok((offset, actual))
    }

    /// Decode `count` elements into `out`, replacing its contents
    pub fn read_elements<T: NdrDecode>(&mut self, out: &'a mut Vec<T>, count: usize) -> Result<()> {
        self.check_count(count, T::ndr_min_size())?;
        out.clear();
        out.resize_with(count, T::default);
        for element in out.iter_mut() {
            element.ndr_decode(self)?;
        }
        Ok(())
    }

    /// Conformant array: `[MaximumCount]` then that many elements. Returns
    /// the maximum count.
    pub fn read_conformant<T: NdrDecode>(&mut self, out: &'a mut Vec<T>) -> Result<usize> {
        let max_count = self.read_size()?;
        self.read_elements(out, max_count)?;
        Ok(max_count)
    }

    /// Conformant varying array: `[MaximumCount][Offset][ActualCount]` then
    /// `ActualCount` elements. Returns `(MaximumCount, ActualCount)`.
    pub fn read_conformant_varying<T: NdrDecode>(&mut self, out: &'a mut Vec<T>) -> Result<(usize, usize)> {
        let max_count = self.read_size()?;
        let (_offset, actual) = self.read_variance(max_count)?;
        self.read_elements(out, actual)?;
        Ok((max_count, actual))
    }

    /// Varying array: `[Offset][ActualCount]` then `ActualCount` elements,
    /// clamped to `capacity`. Returns the offset.
    pub fn read_varying<T: NdrDecode>(&mut self, out: &'a mut Vec<T>, capacity: usize) -> Result<usize> {
        let offset = self.read_size()?;
        let actual = self.read_size()?;
        if actual > capacity {
            return Err(NdrError::CapacityExceeded { count: actual, capacity });
        }
        self.read_elements(out, actual)?;
        Ok(offset)
    }
}

impl std::fmt::Debug for NdrReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdrReader")
            .field("position", &self.pos)
            .field("remaining", &self.remaining())
            .field("pending_deferred", &self.deferred.len())
            .finish()
    }
}
