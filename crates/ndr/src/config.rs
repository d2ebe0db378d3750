//! Codec configuration

/// Default ceiling on any single decoded element count
pub const DEFAULT_MAX_ELEMENTS: usize = 16 * 1024 * 1024;

/// First referent id handed out by a writer (the value MIDL stubs start at)
pub const DEFAULT_REFERENT_ID_BASE: u32 = 0x0002_0000;

/// Increment between consecutive referent ids
pub const DEFAULT_REFERENT_ID_STEP: u32 = 4;

/// Settings shared by [`NdrWriter`](crate::NdrWriter) and [`NdrReader`](crate::NdrReader).
///
/// The defaults are suitable for talking to Windows peers; the builder-style
/// setters exist mostly for tests and for servers that want a tighter
/// allocation ceiling than the remaining-bytes check alone provides.
#[derive(Debug, Clone)]
pub struct NdrConfig {
    /// Absolute ceiling on a decoded array, string or blob element count.
    /// Applied on top of the remaining-bytes check, never instead of it.
    pub max_elements: usize,
    /// First referent id emitted for a non-null pointer
    pub referent_id_base: u32,
    /// Step between referent ids
    pub referent_id_step: u32,
}

impl Default for NdrConfig {
    fn default() -> Self {
        Self {
            max_elements: DEFAULT_MAX_ELEMENTS,
            referent_id_base: DEFAULT_REFERENT_ID_BASE,
            referent_id_step: DEFAULT_REFERENT_ID_STEP,
        }
    }
}

impl NdrConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the decoded element ceiling
    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    /// Set the referent id arena (base and step). A zero base or step is
    /// replaced by the default, since a zero id means "null".
    pub fn with_referent_ids(mut self, base: u32, step: u32) -> Self {
        self.referent_id_base = if base == 0 { DEFAULT_REFERENT_ID_BASE } else { base };
        self.referent_id_step = if step == 0 { DEFAULT_REFERENT_ID_STEP } else { step };
        self
    }
}
