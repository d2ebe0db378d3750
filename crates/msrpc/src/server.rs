//! Server-side opnum dispatch
//!
//! A [`Dispatcher`] maps opnums to handlers. Typed handlers registered with
//! [`Dispatcher::register`] receive the decoded request and return the
//! response plus the status to send; unmarshaling and marshaling happen
//! around the handler, never across its await points.

use crate::error::{Result, RpcError};
use crate::operation::{marshal_reply, unmarshal_request, Operation};
use crate::status::NtStatus;
use bytes::Bytes;
use ndr::NdrConfig;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw operation handler: request stub in, reply stub (including status) out
pub type OperationHandler =
    Arc<dyn Fn(Bytes) -> Pin<Box<dyn Future<Output = Result<Bytes>> + Send>> + Send + Sync>;

struct RegisteredOperation {
    name: &'static str,
    handler: OperationHandler,
}

/// Dispatch counters
#[derive(Debug, Default)]
pub struct DispatchStats {
    pub requests_received: AtomicU64,
    pub requests_processed: AtomicU64,
    pub requests_failed: AtomicU64,
}

/// Opnum to handler table for one interface
pub struct Dispatcher {
    operations: HashMap<u16, RegisteredOperation>,
    config: NdrConfig,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_config(NdrConfig::default())
    }

    pub fn with_config(config: NdrConfig) -> Self {
        Self {
            operations: HashMap::new(),
            config,
            stats: DispatchStats::default(),
        }
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Register a raw handler
    pub fn register_operation<F, Fut>(&mut self, opnum: u16, name: &'static str, handler: F)
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes>> + Send + 'static,
    {
        if self.operations.contains_key(&opnum) {
            warn!("Replacing handler for opnum {} ({})", opnum, name);
        }
        self.operations.insert(
            opnum,
            RegisteredOperation {
                name,
                handler: Arc::new(move |stub| Box::pin(handler(stub))),
            },
        );
    }

    /// Register a typed handler for operation `O`
    pub fn register<O, F, Fut>(&mut self, handler: F)
    where
        O: Operation + 'static,
        O::Response: 'static,
        F: Fn(O) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = (O::Response, NtStatus)> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let config = self.config.clone();
        self.register_operation(O::OPNUM, O::NAME, move |stub| {
            let handler = handler.clone();
            let config = config.clone();
            async move {
                let request = unmarshal_request::<O>(stub, &config)?;
                let (response, status) = handler(request).await;
                debug!("{} (opnum {}) -> {}", O::NAME, O::OPNUM, status);
                marshal_reply(&response, status, &config)
            }
        });
    }

    pub fn has_operation(&self, opnum: u16) -> bool {
        self.operations.contains_key(&opnum)
    }

    /// Run the handler registered for `opnum`
    pub async fn dispatch(&self, opnum: u16, stub: Bytes) -> Result<Bytes> {
        self.stats.requests_received.fetch_add(1, Ordering::Relaxed);
        let Some(operation) = self.operations.get(&opnum) else {
            warn!("No handler for opnum {}", opnum);
            self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
            return Err(RpcError::UnknownOperation(opnum));
        };

        debug!(
            "Dispatching {} (opnum {}): stub_len={}",
            operation.name,
            opnum,
            stub.len()
        );
        let handler = operation.handler.clone();
        match handler(stub).await {
            Ok(reply) => {
                self.stats.requests_processed.fetch_add(1, Ordering::Relaxed);
                Ok(reply)
            }
            Err(e) => {
                warn!("{} (opnum {}) failed: {}", operation.name, opnum, e);
                self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
