//! NDR decoding trait

use crate::config::NdrConfig;
use crate::{NdrReader, Result};
use bytes::Bytes;

/// Trait for types that can be decoded from NDR format
///
/// Decoding fills a default-constructed value in place. A pointer field
/// allocates its pointee and registers a deferred body that completes it
/// once the reader reaches the matching referent.
pub trait NdrDecode: Default {
    /// Decode into `self` from the reader's current position
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()>;

    /// Smallest number of bytes one value can occupy on the wire, used to
    /// bound element counts against the remaining input
    fn ndr_min_size() -> usize {
        1
    }
}

/// Decode one value and its referents with default settings
pub fn decode<T: NdrDecode>(buf: impl Into<Bytes>) -> Result<T> {
    decode_with(buf, &NdrConfig::default())
}

/// Decode one value and its referents
pub fn decode_with<T: NdrDecode>(buf: impl Into<Bytes>, config: &NdrConfig) -> Result<T> {
    let mut value = T::default();
    {
        let mut r = NdrReader::with_config(buf, config);
        r.read_param(&mut value)?;
    }
    Ok(value)
}
