//! NDR writer
//!
//! [`NdrWriter`] owns a growable buffer and the deferred-referent queue for one
//! marshal call. Generated bindings drive it through the `write_*` methods:
//!
//! - `write_align` / `write_<primitive>`: fixed-width little-endian data with
//!   natural alignment
//! - `write_size`: a 32-bit conformance/variance count
//! - `write_switch`: a union selector
//! - `write_pointer` / `write_null_pointer`: referent ids, with the pointee
//!   queued as a deferred body
//! - `write_deferred`: flush queued bodies, one nesting level at a time
//!
//! Writes into the in-memory buffer never fail; the `Result` returns only
//! carry encode-side consistency errors (count overflow, union mismatch).

use crate::config::NdrConfig;
use crate::encode::NdrEncode;
use crate::union::{NdrUnion, SwitchWidth};
use crate::{NdrError, Result};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

/// Deferred pointee body, run after the enclosing aggregate is written
pub type DeferredWrite<'a> = Box<dyn FnOnce(&mut NdrWriter<'a>) -> Result<()> + 'a>;

/// Calculate padding needed to align `position` to `alignment`
#[inline]
pub fn align_padding(position: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return 0;
    }
    let remainder = position % alignment;
    if remainder == 0 {
        0
    } else {
        alignment - remainder
    }
}

/// Validate an alignment requirement (power of two, 1..=8)
#[inline]
pub fn check_alignment(alignment: usize) -> Result<()> {
    if alignment.is_power_of_two() && alignment <= 8 {
        Ok(())
    } else {
        Err(NdrError::InvalidAlignment(alignment))
    }
}

/// Convert a live count to its 32-bit wire form
#[inline]
pub(crate) fn wire_count(count: usize) -> Result<u32> {
    u32::try_from(count).map_err(|_| NdrError::CountOverflow(count))
}

/// Marshaling cursor for one NDR stream
pub struct NdrWriter<'a> {
    buf: BytesMut,
    /// Offset of `buf[0]` within the stub, for alignment of scratch writers
    origin: usize,
    deferred: Vec<DeferredWrite<'a>>,
    next_referent: u32,
    config: NdrConfig,
}

impl<'a> NdrWriter<'a> {
    /// Create a writer with default settings
    pub fn new() -> Self {
        Self::with_config(&NdrConfig::default())
    }

    /// Create a writer with the given settings
    pub fn with_config(config: &NdrConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(256),
            origin: 0,
            deferred: Vec::new(),
            next_referent: config.referent_id_base,
            config: config.clone(),
        }
    }

    /// Scratch writer whose alignment continues from `position`
    fn continuing(position: usize, next_referent: u32, config: &NdrConfig) -> Self {
        Self {
            buf: BytesMut::new(),
            origin: position,
            deferred: Vec::new(),
            next_referent,
            config: config.clone(),
        }
    }

    /// Current offset from the start of the stub
    #[inline]
    pub fn position(&self) -> usize {
        self.origin + self.buf.len()
    }

    /// Bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Settings this writer was created with
    pub fn config(&self) -> &NdrConfig {
        &self.config
    }

    /// Number of pointee bodies waiting for the next `write_deferred`
    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    /// Flush any remaining deferred bodies and return the stub bytes
    pub fn finish(mut self) -> Result<Bytes> {
        self.write_deferred()?;
        Ok(self.buf.freeze())
    }

    /// Emit zero bytes until the position is a multiple of `alignment`
    pub fn write_align(&mut self, alignment: usize) {
        debug_assert!(check_alignment(alignment).is_ok(), "bad alignment {}", alignment);
        let padding = align_padding(self.position(), alignment);
        self.buf.put_bytes(0, padding);
    }

    /// Raw bytes, no alignment
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    #[inline]
    pub fn write_i8(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.write_align(2);
        self.buf.put_u16_le(value);
    }

    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        self.write_align(2);
        self.buf.put_i16_le(value);
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.write_align(4);
        self.buf.put_u32_le(value);
    }

    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.write_align(4);
        self.buf.put_i32_le(value);
    }

    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.write_align(8);
        self.buf.put_u64_le(value);
    }

    #[inline]
    pub fn write_i64(&mut self, value: i64) {
        self.write_align(8);
        self.buf.put_i64_le(value);
    }

    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.write_align(4);
        self.buf.put_f32_le(value);
    }

    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.write_align(8);
        self.buf.put_f64_le(value);
    }

    /// Write a conformance or variance count (aligned 32-bit)
    pub fn write_size(&mut self, count: usize) -> Result<()> {
        let count = wire_count(count)?;
        self.write_u32(count);
        Ok(())
    }

    /// Write a union selector at its declared width
    pub fn write_switch(&mut self, selector: u32, width: SwitchWidth) -> Result<()> {
        match width {
            SwitchWidth::U16 => {
                let selector = u16::try_from(selector).map_err(|_| NdrError::SwitchMismatch { selector })?;
                self.write_u16(selector);
            }
            SwitchWidth::U32 => self.write_u32(selector),
        }
        Ok(())
    }

    /// Write a non-null pointer: emit a fresh referent id now and queue
    /// `body` to run when the enclosing aggregate's deferred bodies are flushed.
    pub fn write_pointer<F>(&mut self, body: F)
    where
        F: FnOnce(&mut NdrWriter<'a>) -> Result<()> + 'a,
    {
        let referent_id = self.next_referent_id();
        self.write_u32(referent_id);
        self.deferred.push(Box::new(body));
    }

    /// Write a null pointer (referent id 0)
    pub fn write_null_pointer(&mut self) {
        self.write_u32(0);
    }

    /// Flush deferred pointee bodies.
    ///
    /// Bodies run in the order their pointers were written. Bodies queued
    /// while flushing (pointers embedded in pointees) form the next level and
    /// run only after the whole current level has been written.
    pub fn write_deferred(&mut self) -> Result<()> {
        let mut level = 0usize;
        while !self.deferred.is_empty() {
            let pending = std::mem::take(&mut self.deferred);
            trace!("writing {} deferred referents at level {}", pending.len(), level);
            for body in pending {
                body(self)?;
            }
            level += 1;
        }
        Ok(())
    }

    /// Write one top-level parameter: the value followed by all of its
    /// deferred referents.
    pub fn write_param<T: NdrEncode + ?Sized>(&mut self, value: &'a T) -> Result<()> {
        value.ndr_encode(self)?;
        self.write_deferred()
    }

    /// Write a union: selector, padding to the widest arm, then the arm body
    pub fn write_union<U: NdrUnion>(&mut self, selector: u32, value: &'a U) -> Result<()> {
        self.write_switch(selector, U::SWITCH)?;
        self.write_align(U::ARM_ALIGN);
        value.encode_arm(selector, self)
    }

    /// Write `count` elements from `elements`, padding with `T::default()`
    /// when the live collection is shorter than the transmitted count.
    pub fn write_elements<T: NdrEncode + Default>(&mut self, elements: &'a [T], count: usize) -> Result<()> {
        for element in elements.iter().take(count) {
            element.ndr_encode(self)?;
        }
        if elements.len() < count {
            self.write_filler::<T>(count - elements.len())?;
        }
        Ok(())
    }

    /// Zero-valued placeholder elements. Filler values are default-constructed
    /// and therefore carry no referents, so they are encoded through a scratch
    /// writer positioned at the current offset.
    fn write_filler<T: NdrEncode + Default>(&mut self, count: usize) -> Result<()> {
        let filler = T::default();
        let mut scratch = NdrWriter::continuing(self.position(), self.next_referent, &self.config);
        for _ in 0..count {
            filler.ndr_encode(&mut scratch)?;
        }
        scratch.write_deferred()?;
        self.buf.put_slice(&scratch.buf);
        Ok(())
    }

    /// Conformant array: `[MaximumCount]` then `max_count` elements
    pub fn write_conformant<T: NdrEncode + Default>(&mut self, max_count: usize, elements: &'a [T]) -> Result<()> {
        self.write_size(max_count)?;
        self.write_elements(elements, max_count)
    }

    /// Conformant varying array: `[MaximumCount][Offset][ActualCount]` then
    /// `ActualCount` elements. `ActualCount` is clamped to `max_count`.
    pub fn write_conformant_varying<T: NdrEncode + Default>(
        &mut self,
        max_count: usize,
        actual_count: usize,
        elements: &'a [T],
    ) -> Result<()> {
        let actual_count = actual_count.min(max_count);
        self.write_size(max_count)?;
        self.write_size(0)?;
        self.write_size(actual_count)?;
        self.write_elements(elements, actual_count)
    }

    /// Varying array: `[Offset][ActualCount]` then `ActualCount` elements
    pub fn write_varying<T: NdrEncode + Default>(&mut self, offset: usize, elements: &'a [T]) -> Result<()> {
        self.write_size(offset)?;
        self.write_size(elements.len())?;
        self.write_elements(elements, elements.len())
    }

    fn next_referent_id(&mut self) -> u32 {
        let id = self.next_referent;
        self.next_referent = self.next_referent.wrapping_add(self.config.referent_id_step);
        if self.next_referent == 0 {
            self.next_referent = self.config.referent_id_step;
        }
        id
    }
}

impl Default for NdrWriter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NdrWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NdrWriter")
            .field("position", &self.position())
            .field("pending_deferred", &self.deferred.len())
            .field("next_referent", &self.next_referent)
            .finish()
    }
}
