//! Error types for RPC calls

use crate::status::NtStatus;
use ndr::NdrError;
use std::fmt;
use thiserror::Error;

/// A nonzero status returned by the peer, with the call it came from
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} (opnum {opnum}): {code}")]
pub struct StatusError {
    pub code: NtStatus,
    pub operation: &'static str,
    pub opnum: u16,
}

/// RPC error types
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("NDR error: {0}")]
    Ndr(#[from] NdrError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation unavailable: {0}")]
    UnknownOperation(u16),

    #[error("{operation}: invalid argument: {reason}")]
    InvalidArgument { operation: &'static str, reason: String },

    #[error("{operation}: context handle has been closed")]
    ClosedHandle { operation: &'static str },

    #[error(transparent)]
    Status(StatusError),

    #[error("reply too large: {size} bytes exceeds maximum {max}")]
    ReplyTooLarge { size: usize, max: usize },

    #[error("{operation}: {remaining} unexpected bytes after status")]
    TrailingBytes { operation: &'static str, remaining: usize },
}

impl RpcError {
    /// Status code, if this error came from the peer
    pub fn status(&self) -> Option<NtStatus> {
        match self {
            RpcError::Status(e) => Some(e.code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;

/// Failure of a typed call
///
/// A nonzero status still carries the out-parameters that were unmarshaled
/// before it, since some statuses (e.g. `STATUS_MORE_ENTRIES`) accompany a
/// usable partial result.
#[derive(Debug)]
pub enum CallError<R> {
    /// Local or transport failure; no response is available
    Rpc(RpcError),
    /// The peer returned a nonzero status
    Status { error: StatusError, partial: R },
}

impl<R> CallError<R> {
    pub fn status(&self) -> Option<NtStatus> {
        match self {
            CallError::Rpc(e) => e.status(),
            CallError::Status { error, .. } => Some(error.code),
        }
    }

    pub fn partial(&self) -> Option<&R> {
        match self {
            CallError::Status { partial, .. } => Some(partial),
            CallError::Rpc(_) => None,
        }
    }

    pub fn into_partial(self) -> Option<R> {
        match self {
            CallError::Status { partial, .. } => Some(partial),
            CallError::Rpc(_) => None,
        }
    }

    /// Drop any partial result
    pub fn into_rpc(self) -> RpcError {
        match self {
            CallError::Rpc(e) => e,
            CallError::Status { error, .. } => RpcError::Status(error),
        }
    }
}

impl<R> fmt::Display for CallError<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Rpc(e) => e.fmt(f),
            CallError::Status { error, .. } => error.fmt(f),
        }
    }
}

impl<R: fmt::Debug> std::error::Error for CallError<R> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Rpc(e) => e.source(),
            CallError::Status { .. } => None,
        }
    }
}

impl<R> From<RpcError> for CallError<R> {
    fn from(e: RpcError) -> Self {
        CallError::Rpc(e)
    }
}

impl<R> From<NdrError> for CallError<R> {
    fn from(e: NdrError) -> Self {
        CallError::Rpc(RpcError::Ndr(e))
    }
}

impl<R> From<CallError<R>> for RpcError {
    fn from(e: CallError<R>) -> Self {
        e.into_rpc()
    }
}

pub type CallResult<R> = std::result::Result<R, CallError<R>>;
