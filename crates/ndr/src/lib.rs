//! NDR (Network Data Representation) codec
//!
//! This crate implements the NDR 2.0 transfer syntax used by DCE RPC and
//! MS-RPCE stubs, little-endian only. Bindings drive an [`NdrWriter`] or
//! [`NdrReader`] directly, or implement [`NdrEncode`]/[`NdrDecode`] and use
//! the [`encode`]/[`decode`] helpers.
//!
//! # NDR Wire Format
//!
//! - Primitives align to their natural size (1, 2, 4, or 8 bytes)
//! - Structures align to their largest member
//! - Embedded pointers are a 4-byte referent id; pointees follow the
//!   enclosing aggregate, one nesting level at a time
//! - Conformant and varying arrays carry 32-bit count headers
//! - Unions are a selector followed by one arm
//!
//! # Example
//!
//! ```
//! use ndr::{decode, encode, CountedString};
//!
//! let s = CountedString::new(b"ab".to_vec());
//! let bytes = encode(&s).unwrap();
//! let back: CountedString = decode(bytes).unwrap();
//! assert_eq!(back.as_bytes(), b"ab");
//! ```

mod arrays;
mod config;
mod decode;
mod encode;
mod error;
mod handle;
mod normalize;
mod pointers;
mod primitives;
mod reader;
mod strings;
mod union;
mod writer;

pub use arrays::{ConformantArray, ConformantVaryingArray, FixedArray, VaryingArray};
pub use config::{NdrConfig, DEFAULT_MAX_ELEMENTS, DEFAULT_REFERENT_ID_BASE, DEFAULT_REFERENT_ID_STEP};
pub use decode::{decode, decode_with, NdrDecode};
pub use encode::{encode, encode_with, NdrEncode};
pub use error::{NdrError, Result};
pub use handle::{ContextHandle, CONTEXT_HANDLE_SIZE};
pub use normalize::Normalize;
pub use pointers::{FullPtr, NdrPtr, UniquePtr};
pub use primitives::Uuid;
pub use reader::{DeferredRead, NdrReader};
pub use strings::{AString, CountedString, UnicodeString, WString};
pub use union::{NdrUnion, RawArm, SwitchWidth, Switched};
pub use writer::{align_padding, DeferredWrite, NdrWriter};

/// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};
