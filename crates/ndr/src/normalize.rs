//! Pre-marshal reconciliation of derived fields
//!
//! Length and count fields that mirror the size of a sibling buffer are
//! recomputed by an explicit [`Normalize::normalize`] call before encoding.
//! Encoding itself never writes back into the value being encoded.

use crate::{ConformantArray, ConformantVaryingArray, FullPtr, UniquePtr};

/// Recompute fields derived from the value's own contents
pub trait Normalize {
    fn normalize(&mut self);
}

impl<T: Normalize> Normalize for UniquePtr<T> {
    fn normalize(&mut self) {
        if let Some(value) = self.0.as_deref_mut() {
            value.normalize();
        }
    }
}

impl<T: Normalize> Normalize for FullPtr<T> {
    fn normalize(&mut self) {
        if let Some(value) = self.0.as_deref_mut() {
            value.normalize();
        }
    }
}

impl<T: Normalize> Normalize for Vec<T> {
    fn normalize(&mut self) {
        self.iter_mut().for_each(Normalize::normalize);
    }
}

impl<T: Normalize> Normalize for ConformantArray<T> {
    fn normalize(&mut self) {
        self.elements.normalize();
        if let Some(max_count) = self.max_count {
            self.max_count = Some(max_count.max(self.elements.len()));
        }
    }
}

impl<T: Normalize> Normalize for ConformantVaryingArray<T> {
    fn normalize(&mut self) {
        self.elements.normalize();
        if let Some(max_count) = self.max_count {
            self.max_count = Some(max_count.max(self.elements.len()));
        }
    }
}
