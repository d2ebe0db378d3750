//! DCE/RPC operation envelope
//!
//! This crate binds typed requests to opnums and runs them over a
//! [`Transport`]: marshal the "in" parameters with the [`ndr`] codec, send,
//! unmarshal the "out" parameters and the trailing NTSTATUS, and map a
//! nonzero status to an error that keeps the partial result.
//!
//! # Example
//!
//! ```ignore
//! use msrpc::{Client, Loopback, Dispatcher};
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register(|req: OpenPolicy2| async move { server.open(req) });
//! let client = Client::new(Loopback::new(dispatcher));
//! let reply = client.call(&OpenPolicy2::new("\\\\dc01")).await?;
//! ```

pub mod client;
pub mod error;
pub mod operation;
pub mod server;
pub mod status;
pub mod transport;

pub use client::{Client, ClientBuilder, ClientConfig, DEFAULT_MAX_REPLY_SIZE};
pub use error::{CallError, CallResult, Result, RpcError, StatusError};
pub use operation::{marshal_reply, marshal_request, unmarshal_reply, unmarshal_request, Operation, Reply};
pub use server::{DispatchStats, Dispatcher, OperationHandler};
pub use status::{NtStatus, Severity};
pub use transport::{Loopback, Transport};

pub use ndr;
