//! NDR error types

use thiserror::Error;

/// NDR encoding/decoding errors
#[derive(Debug, Error)]
pub enum NdrError {
    /// Fewer bytes remain than the next read requires
    #[error("truncated input: needed {needed} bytes, have {have}")]
    TruncatedInput { needed: usize, have: usize },

    /// A declared count cannot possibly be backed by the remaining input
    #[error("buffer overflow: {count} elements of at least {element_size} bytes declared, {remaining} bytes remain")]
    BufferOverflow {
        count: usize,
        element_size: usize,
        remaining: usize,
    },

    /// A declared count exceeds the configured ceiling
    #[error("allocation limit exceeded: requested {requested} elements, limit {limit}")]
    AllocationLimitExceeded { requested: usize, limit: usize },

    /// A varying array does not fit its declared fixed capacity
    #[error("capacity exceeded: {count} elements, capacity {capacity}")]
    CapacityExceeded { count: usize, capacity: usize },

    /// Union selector matches no arm and the union has no default arm
    #[error("unsupported switch value: {0}")]
    UnsupportedSwitchValue(u32),

    /// Selector supplied for encoding disagrees with the arm held by the union
    #[error("switch value {selector} does not select the arm being encoded")]
    SwitchMismatch { selector: u32 },

    /// A count field disagrees with the conformance of the array it sizes
    #[error("count field {count} does not match array conformance {conformance}")]
    ConformanceMismatch { count: usize, conformance: usize },

    /// A live count does not fit the 32-bit wire size field
    #[error("count {0} does not fit a 32-bit NDR size")]
    CountOverflow(usize),

    /// Alignment is not a power of two between 1 and 8
    #[error("invalid alignment: {0}")]
    InvalidAlignment(usize),

    /// Invalid string - bad terminator or header
    #[error("invalid string: {0}")]
    InvalidString(String),

    /// UTF-8 decoding error
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// UTF-16 decoding error
    #[error("UTF-16 error: {0}")]
    Utf16(#[from] std::char::DecodeUtf16Error),
}

/// Result type for NDR operations
pub type Result<T> = std::result::Result<T, NdrError>;
