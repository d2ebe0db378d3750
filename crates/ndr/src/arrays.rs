//! NDR array types
//!
//! | Kind               | Header                               |
//! |--------------------|--------------------------------------|
//! | fixed              | none                                 |
//! | conformant         | `[MaximumCount]`                     |
//! | varying            | `[Offset][ActualCount]`              |
//! | conformant varying | `[MaximumCount][Offset][ActualCount]`|
//!
//! When the transmitted count is larger than the live collection, the
//! missing tail is written as `T::default()` elements.

use crate::{NdrDecode, NdrEncode, NdrError, NdrReader, NdrWriter, Result};

/// Fixed-size array
///
/// Wire format: just the elements (no size prefix)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedArray<T, const N: usize> {
    pub elements: [T; N],
}

impl<T: Default, const N: usize> Default for FixedArray<T, N> {
    fn default() -> Self {
        Self {
            elements: std::array::from_fn(|_| T::default()),
        }
    }
}

impl<T, const N: usize> FixedArray<T, N> {
    pub fn new(elements: [T; N]) -> Self {
        Self { elements }
    }
}

impl<T: NdrEncode, const N: usize> NdrEncode for FixedArray<T, N> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_align(T::ndr_align());
        for element in &self.elements {
            element.ndr_encode(w)?;
        }
        Ok(())
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }
}

impl<T: NdrDecode, const N: usize> NdrDecode for FixedArray<T, N> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        for element in self.elements.iter_mut() {
            element.ndr_decode(r)?;
        }
        Ok(())
    }

    fn ndr_min_size() -> usize {
        T::ndr_min_size() * N
    }
}

/// Conformant array - size determined at runtime
///
/// Wire format:
/// ```text
/// max_count: u32      # Maximum elements
/// elements[max_count] # Element data
/// ```
///
/// `max_count` defaults to the number of live elements when unset. Values
/// compare by transmitted count, so `None` equals `Some(len)`.
#[derive(Debug, Clone)]
pub struct ConformantArray<T> {
    pub max_count: Option<usize>,
    pub elements: Vec<T>,
}

impl<T> Default for ConformantArray<T> {
    fn default() -> Self {
        Self {
            max_count: None,
            elements: Vec::new(),
        }
    }
}

impl<T> ConformantArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self {
            max_count: None,
            elements,
        }
    }

    pub fn with_max(max_count: usize, elements: Vec<T>) -> Self {
        Self {
            max_count: Some(max_count),
            elements,
        }
    }

    /// Count transmitted in the header
    pub fn transmitted_count(&self) -> usize {
        self.max_count.unwrap_or(self.elements.len())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T: PartialEq> PartialEq for ConformantArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.transmitted_count() == other.transmitted_count() && self.elements == other.elements
    }
}

impl<T: Eq> Eq for ConformantArray<T> {}

impl<T> From<Vec<T>> for ConformantArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self::new(elements)
    }
}

impl<T: NdrEncode + Default> NdrEncode for ConformantArray<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_conformant(self.transmitted_count(), &self.elements)
    }

    fn ndr_align() -> usize {
        T::ndr_align().max(4)
    }
}

impl<T: NdrDecode> NdrDecode for ConformantArray<T> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        let max_count = r.read_conformant(&mut self.elements)?;
        // read_conformant leaves exactly `max_count` elements on success
        let len = max_count;
        self.max_count = (max_count != len).then_some(max_count);
        Ok(())
    }

    fn ndr_min_size() -> usize {
        4
    }
}

/// Varying array - a prefix of a fixed-capacity array
///
/// Wire format:
/// ```text
/// offset: u32       # First transmitted element
/// actual_count: u32 # Number of transmitted elements
/// elements[actual_count]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaryingArray<T, const N: usize> {
    pub offset: usize,
    pub elements: Vec<T>,
}

impl<T, const N: usize> Default for VaryingArray<T, N> {
    fn default() -> Self {
        Self {
            offset: 0,
            elements: Vec::new(),
        }
    }
}

impl<T, const N: usize> VaryingArray<T, N> {
    pub fn new(elements: Vec<T>) -> Self {
        Self { offset: 0, elements }
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T: NdrEncode + Default, const N: usize> NdrEncode for VaryingArray<T, N> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        if self.elements.len() > N {
            return Err(NdrError::CapacityExceeded {
                count: self.elements.len(),
                capacity: N,
            });
        }
        w.write_varying(self.offset, &self.elements)
    }

    fn ndr_align() -> usize {
        T::ndr_align().max(4)
    }
}

impl<T: NdrDecode, const N: usize> NdrDecode for VaryingArray<T, N> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.offset = r.read_varying(&mut self.elements, N)?;
        Ok(())
    }

    fn ndr_min_size() -> usize {
        8
    }
}

/// Conformant varying array - size and subset determined at runtime
///
/// Wire format:
/// ```text
/// max_count: u32    # Maximum elements (conformance)
/// offset: u32       # First transmitted element
/// actual_count: u32 # Number of transmitted elements
/// elements[actual_count]
/// ```
#[derive(Debug, Clone)]
pub struct ConformantVaryingArray<T> {
    pub max_count: Option<usize>,
    pub offset: usize,
    pub elements: Vec<T>,
}

impl<T> Default for ConformantVaryingArray<T> {
    fn default() -> Self {
        Self {
            max_count: None,
            offset: 0,
            elements: Vec::new(),
        }
    }
}

impl<T> ConformantVaryingArray<T> {
    pub fn new(elements: Vec<T>) -> Self {
        Self {
            max_count: None,
            offset: 0,
            elements,
        }
    }

    pub fn with_max(max_count: usize, elements: Vec<T>) -> Self {
        Self {
            max_count: Some(max_count),
            offset: 0,
            elements,
        }
    }

    /// `MaximumCount` transmitted in the header
    pub fn transmitted_count(&self) -> usize {
        self.max_count.unwrap_or(self.elements.len())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T: PartialEq> PartialEq for ConformantVaryingArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.transmitted_count() == other.transmitted_count()
            && self.offset == other.offset
            && self.elements == other.elements
    }
}

impl<T: Eq> Eq for ConformantVaryingArray<T> {}

impl<T> From<Vec<T>> for ConformantVaryingArray<T> {
    fn from(elements: Vec<T>) -> Self {
        Self::new(elements)
    }
}

impl<T: NdrEncode + Default> NdrEncode for ConformantVaryingArray<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        let max_count = self.transmitted_count();
        let actual_count = self.elements.len().min(max_count);
        w.write_size(max_count)?;
        w.write_size(self.offset)?;
        w.write_size(actual_count)?;
        w.write_elements(&self.elements, actual_count)
    }

    fn ndr_align() -> usize {
        T::ndr_align().max(4)
    }
}

impl<T: NdrDecode> NdrDecode for ConformantVaryingArray<T> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        let max_count = r.read_size()?;
        let (offset, actual) = r.read_variance(max_count)?;
        r.read_elements(&mut self.elements, actual)?;
        // read_elements leaves exactly `actual` elements on success
        let len = actual;
        self.max_count = (max_count != len).then_some(max_count);
        self.offset = offset;
        Ok(())
    }

    fn ndr_min_size() -> usize {
        12
    }
}
