//! Hand-written binding for a subset of the LSA policy interface


pub use client::PolicyClient;
pub use operations::*;
pub use types::*;
