//! NTSTATUS codes
//!
//! Operations end their reply with a signed 32-bit status. Only the codes the
//! LSA family documents are named here; anything else renders as
//! `STATUS_UNKNOWN` with its numeric value.

use std::fmt;

/// Severity field of an NTSTATUS (top two bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Informational,
    Warning,
    Error,
}

/// A 32-bit NTSTATUS value
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NtStatus(pub i32);

macro_rules! nt_status_table {
    ($($name:ident = $code:literal,)*) => {
        impl NtStatus {
            $(pub const $name: NtStatus = NtStatus::from_u32($code);)*

            /// Symbolic name, e.g. `STATUS_ACCESS_DENIED`
            pub fn name(self) -> &'static str {
                match self.code() {
                    $($code => concat!("STATUS_", stringify!($name)),)*
                    _ => "STATUS_UNKNOWN",
                }
            }
        }
    };
}

nt_status_table! {
    SUCCESS = 0x0000_0000,
    MORE_ENTRIES = 0x0000_0105,
    SOME_NOT_MAPPED = 0x0000_0107,
    OBJECT_NAME_EXISTS = 0x4000_0000,
    NO_MORE_ENTRIES = 0x8000_001A,
    NOT_IMPLEMENTED = 0xC000_0002,
    INVALID_INFO_CLASS = 0xC000_0003,
    INVALID_HANDLE = 0xC000_0008,
    INVALID_PARAMETER = 0xC000_000D,
    ACCESS_DENIED = 0xC000_0022,
    BUFFER_TOO_SMALL = 0xC000_0023,
    OBJECT_NAME_NOT_FOUND = 0xC000_0034,
    OBJECT_NAME_COLLISION = 0xC000_0035,
    NO_SUCH_PRIVILEGE = 0xC000_0060,
    NONE_MAPPED = 0xC000_0073,
    INVALID_SID = 0xC000_0078,
    INVALID_SECURITY_DESCR = 0xC000_0079,
    INSUFFICIENT_RESOURCES = 0xC000_009A,
    NOT_SUPPORTED = 0xC000_00BB,
    INVALID_SERVER_STATE = 0xC000_00DC,
    INVALID_DOMAIN_STATE = 0xC000_00DD,
    INVALID_DOMAIN_ROLE = 0xC000_00DE,
    NO_SUCH_DOMAIN = 0xC000_00DF,
    INTERNAL_ERROR = 0xC000_00E5,
    NAME_TOO_LONG = 0xC000_0106,
    TOO_MANY_SIDS = 0xC000_017E,
    NOT_FOUND = 0xC000_0225,
    DIRECTORY_SERVICE_REQUIRED = 0xC000_02B1,
}

impl NtStatus {
    pub const fn from_u32(code: u32) -> Self {
        Self(code as i32)
    }

    /// Unsigned form, as status codes are usually written
    pub const fn code(self) -> u32 {
        self.0 as u32
    }

    pub fn severity(self) -> Severity {
        match self.code() >> 30 {
            0 => Severity::Success,
            1 => Severity::Informational,
            2 => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// `NT_SUCCESS`: success or informational severity. Informational codes
    /// such as `STATUS_MORE_ENTRIES` are still reported to the caller as a
    /// nonzero status.
    pub fn is_success(self) -> bool {
        matches!(self.severity(), Severity::Success | Severity::Informational)
    }

    pub fn is_error(self) -> bool {
        self.severity() == Severity::Error
    }
}

impl From<u32> for NtStatus {
    fn from(code: u32) -> Self {
        Self::from_u32(code)
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.name(), self.code())
    }
}

impl fmt::Debug for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NtStatus({})", self)
    }
}
