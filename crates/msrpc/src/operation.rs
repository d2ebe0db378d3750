//! Typed operations
//!
//! An [`Operation`] is the request half of one remote procedure: its "in" and
//! "in,out" parameters in declared order, plus the opnum it is sent under.
//! The associated [`Operation::Response`] holds the "out" and "in,out"
//! parameters; the trailing status is not part of it.
//!
//! Implementations write each top-level parameter with
//! [`NdrWriter::write_param`](ndr::NdrWriter::write_param) (and read it with
//! `read_param`) so every parameter's referents follow that parameter.

use crate::error::{CallError, CallResult, RpcError, StatusError};
use crate::status::NtStatus;
use ndr::{encode_with, ContextHandle, NdrConfig, NdrDecode, NdrEncode, NdrReader, NdrWriter};
use bytes::Bytes;

/// One remote procedure of an interface
pub trait Operation: NdrEncode + NdrDecode + Send + Sync {
    /// Procedure number within the interface
    const OPNUM: u16;

    /// Procedure name used in logs and errors
    const NAME: &'static str;

    /// Out-parameters, excluding the status
    type Response: NdrEncode + NdrDecode + Send;

    /// Check call-construction-time limits before anything is marshaled.
    /// Must not modify the request.
    fn validate(&self) -> Result<(), RpcError> {
        Ok(())
    }

    /// The context handle this call is made against, if any
    fn context_handle(&self) -> Option<&ContextHandle> {
        None
    }

    /// Shorthand for an [`RpcError::InvalidArgument`] naming this operation
    fn invalid_argument(reason: impl Into<String>) -> RpcError {
        RpcError::InvalidArgument {
            operation: Self::NAME,
            reason: reason.into(),
        }
    }
}

/// Marshal the "in" parameters of a request
pub fn marshal_request<O: Operation>(request: &O, config: &NdrConfig) -> Result<Bytes, RpcError> {
    Ok(encode_with(request, config)?)
}

/// Unmarshal a request on the server side
pub fn unmarshal_request<O: Operation>(stub: Bytes, config: &NdrConfig) -> Result<O, RpcError> {
    Ok(ndr::decode_with(stub, config)?)
}

/// Marshal the "out" parameters followed by the status
pub fn marshal_reply<R: NdrEncode>(response: &R, status: NtStatus, config: &NdrConfig) -> Result<Bytes, RpcError> {
    let mut w = NdrWriter::with_config(config);
    w.write_param(response)?;
    w.write_i32(status.0);
    Ok(w.finish()?)
}

/// Result of reading a reply stub before the status is interpreted
#[derive(Debug)]
pub struct Reply<R> {
    pub response: R,
    pub status: NtStatus,
    /// Bytes left after the status
    pub trailing: usize,
}

/// Read the "out" parameters and the trailing status of a reply
pub fn unmarshal_reply<O: Operation>(stub: Bytes, config: &NdrConfig) -> Result<Reply<O::Response>, RpcError> {
    let mut response = O::Response::default();
    let (status, trailing) = {
        let mut r = NdrReader::with_config(stub, config);
        r.read_param(&mut response)?;
        let status = r.read_i32()?;
        (NtStatus(status), r.remaining())
    };
    Ok(Reply {
        response,
        status,
        trailing,
    })
}

impl<R> Reply<R> {
    /// Map a nonzero status to [`CallError::Status`], keeping the response
    pub fn into_result<O: Operation>(self) -> CallResult<R> {
        if self.status == NtStatus::SUCCESS {
            return Ok(self.response);
        }
        Err(CallError::Status {
            error: StatusError {
                code: self.status,
                operation: O::NAME,
                opnum: O::OPNUM,
            },
            partial: self.response,
        })
    }
}
