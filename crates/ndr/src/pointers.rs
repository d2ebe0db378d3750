//! NDR pointer types
//!
//! Embedded pointers are written as a 4-byte referent id in place (0 = null)
//! with the pointee deferred until the enclosing aggregate is complete:
//!
//! - Unique (`[unique]`): nullable, no aliasing
//! - Full (`[ptr]`): nullable, aliasing allowed on the wire
//!
//! Top-level `[ref]` parameters carry no referent id and are encoded as the
//! bare value.

use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};
use std::fmt;

/// Trait for NDR pointer types
pub trait NdrPtr {
    type Target;

    /// Check if the pointer is null
    fn is_null(&self) -> bool;

    /// Get the inner value, if any
    fn get(&self) -> Option<&Self::Target>;

    /// Get a mutable reference to the inner value, if any
    fn get_mut(&mut self) -> Option<&mut Self::Target>;
}

macro_rules! ndr_pointer {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name<T>(pub Option<Box<T>>);

        impl<T> $name<T> {
            pub fn new(value: T) -> Self {
                Self(Some(Box::new(value)))
            }

            pub fn null() -> Self {
                Self(None)
            }

            pub fn into_option(self) -> Option<T> {
                self.0.map(|b| *b)
            }

            pub fn as_ref(&self) -> Option<&T> {
                self.0.as_deref()
            }

            pub fn as_mut(&mut self) -> Option<&mut T> {
                self.0.as_deref_mut()
            }
        }

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self::null()
            }
        }

        impl<T> From<Option<T>> for $name<T> {
            fn from(opt: Option<T>) -> Self {
                Self(opt.map(Box::new))
            }
        }

        impl<T: fmt::Debug> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match &self.0 {
                    Some(value) => f.debug_tuple(stringify!($name)).field(value).finish(),
                    None => f.write_str("null"),
                }
            }
        }

        impl<T> NdrPtr for $name<T> {
            type Target = T;

            fn is_null(&self) -> bool {
                self.0.is_none()
            }

            fn get(&self) -> Option<&T> {
                self.0.as_deref()
            }

            fn get_mut(&mut self) -> Option<&mut T> {
                self.0.as_deref_mut()
            }
        }

        impl<T: NdrEncode> NdrEncode for $name<T> {
            fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
                match self.0.as_deref() {
                    Some(value) => w.write_pointer(move |w| value.ndr_encode(w)),
                    None => w.write_null_pointer(),
                }
                Ok(())
            }

            fn ndr_align() -> usize {
                4
            }
        }

        impl<T: NdrDecode> NdrDecode for $name<T> {
            fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
                if r.read_pointer()?.is_none() {
                    self.0 = None;
                    return Ok(());
                }
                let pointee: &'a mut T = self.0.insert(Box::default());
                r.defer(move |r| pointee.ndr_decode(r));
                Ok(())
            }

            fn ndr_min_size() -> usize {
                4
            }
        }
    };
}

ndr_pointer!(
    /// Unique pointer - nullable, no aliasing
    ///
    /// Encoded as a 4-byte referent id; a non-null pointee follows in the
    /// deferred section of the enclosing aggregate.
    UniquePtr
);

ndr_pointer!(
    /// Full pointer - nullable, aliasing allowed
    ///
    /// Same wire format as [`UniquePtr`]. Aliasing is not reconstructed: the
    /// writer gives every non-null pointer its own referent id, and the reader
    /// decodes a repeated referent id as an independent copy of the pointee.
    /// Protocols that depend on two pointers sharing one object need a
    /// referent table on top of this type.
    FullPtr
);
