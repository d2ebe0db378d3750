//! NDR encoding trait

use crate::config::NdrConfig;
use crate::{NdrWriter, Result};
use bytes::Bytes;

/// Trait for types that can be encoded to NDR format
///
/// The writer's lifetime ties queued pointee bodies to `self`, so an
/// implementation can hand borrowed fields to [`NdrWriter::write_pointer`]
/// without cloning them.
pub trait NdrEncode {
    /// Encode this value at the writer's current position. Pointees are only
    /// queued; they are written when the caller flushes deferred bodies.
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()>;

    /// Get the NDR alignment requirement for this type
    fn ndr_align() -> usize
    where
        Self: Sized,
    {
        1
    }
}

/// Encode one value and its referents with default settings
pub fn encode<T: NdrEncode + ?Sized>(value: &T) -> Result<Bytes> {
    encode_with(value, &NdrConfig::default())
}

/// Encode one value and its referents
pub fn encode_with<T: NdrEncode + ?Sized>(value: &T, config: &NdrConfig) -> Result<Bytes> {
    let mut w = NdrWriter::with_config(config);
    w.write_param(value)?;
    w.finish()
}
