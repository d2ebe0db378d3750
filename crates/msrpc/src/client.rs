//! RPC client envelope
//!
//! [`Client::call`] runs one typed operation over a [`Transport`]:
//!
//! 1. validate the request and check its context handle locally
//! 2. marshal the "in" parameters
//! 3. exchange stubs through the transport
//! 4. unmarshal the "out" parameters and the trailing status
//!
//! Marshaling and unmarshaling are synchronous; the only suspension point is
//! the transport call. Nothing is retried and the request is never modified.

use crate::error::{CallResult, RpcError};
use crate::operation::{marshal_request, unmarshal_reply, Operation};
use crate::transport::Transport;
use ndr::NdrConfig;
use tracing::{debug, trace};

/// Default ceiling on a reply stub
pub const DEFAULT_MAX_REPLY_SIZE: usize = 16 * 1024 * 1024;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Codec settings for requests and replies
    pub ndr: NdrConfig,
    /// Replies larger than this are rejected before decoding
    pub max_reply_size: usize,
    /// Fail calls whose reply has bytes left after the status
    pub strict_trailing_bytes: bool,
    /// Reject calls made with a zeroed context handle without sending them
    pub check_local_handles: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ndr: NdrConfig::default(),
            max_reply_size: DEFAULT_MAX_REPLY_SIZE,
            strict_trailing_bytes: false,
            check_local_handles: true,
        }
    }
}

/// Builder for [`Client`]
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ndr_config(mut self, ndr: NdrConfig) -> Self {
        self.config.ndr = ndr;
        self
    }

    pub fn max_reply_size(mut self, max: usize) -> Self {
        self.config.max_reply_size = max;
        self
    }

    pub fn strict_trailing_bytes(mut self, strict: bool) -> Self {
        self.config.strict_trailing_bytes = strict;
        self
    }

    pub fn check_local_handles(mut self, check: bool) -> Self {
        self.config.check_local_handles = check;
        self
    }

    pub fn build<T: Transport>(self, transport: T) -> Client<T> {
        Client {
            transport,
            config: self.config,
        }
    }
}

/// Typed RPC client over a transport
pub struct Client<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        ClientBuilder::new().build(transport)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Make a typed call
    ///
    /// A nonzero status is returned as [`CallError::Status`](crate::CallError::Status)
    /// together with whatever out-parameters the reply carried.
    pub async fn call<O: Operation>(&self, request: &O) -> CallResult<O::Response> {
        request.validate()?;

        if self.config.check_local_handles {
            if let Some(handle) = request.context_handle() {
                if handle.is_nil() {
                    debug!("{} (opnum {}): refusing call with closed handle", O::NAME, O::OPNUM);
                    return Err(RpcError::ClosedHandle { operation: O::NAME }.into());
                }
            }
        }

        let stub = marshal_request(request, &self.config.ndr)?;
        debug!(
            "Calling {} (opnum {}): stub_len={}",
            O::NAME,
            O::OPNUM,
            stub.len()
        );
        trace!("{} request stub: {:02x?}", O::NAME, &stub[..stub.len().min(64)]);

        let reply = self.transport.invoke(O::OPNUM, stub).await?;

        if reply.len() > self.config.max_reply_size {
            return Err(RpcError::ReplyTooLarge {
                size: reply.len(),
                max: self.config.max_reply_size,
            }
            .into());
        }
        trace!("{} reply stub: {:02x?}", O::NAME, &reply[..reply.len().min(64)]);

        let reply = unmarshal_reply::<O>(reply, &self.config.ndr)?;
        debug!(
            "{} (opnum {}) returned {}",
            O::NAME,
            O::OPNUM,
            reply.status
        );
        if reply.trailing > 0 {
            if self.config.strict_trailing_bytes {
                return Err(RpcError::TrailingBytes {
                    operation: O::NAME,
                    remaining: reply.trailing,
                }
                .into());
            }
            debug!("{}: ignoring {} bytes after status", O::NAME, reply.trailing);
        }
        reply.into_result::<O>()
    }
}
