//! Transport seam
//!
//! The envelope hands a marshaled request stub and its opnum to a
//! [`Transport`] and gets the reply stub back. Binding, fragmentation,
//! authentication and timeouts all live behind this trait.

use crate::error::Result;
use crate::server::Dispatcher;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::trace;

/// Exchanges stub data for one call
#[async_trait]
pub trait Transport: Send + Sync {
    async fn invoke(&self, opnum: u16, request: Bytes) -> Result<Bytes>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn invoke(&self, opnum: u16, request: Bytes) -> Result<Bytes> {
        (**self).invoke(opnum, request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn invoke(&self, opnum: u16, request: Bytes) -> Result<Bytes> {
        (**self).invoke(opnum, request).await
    }
}

/// In-process transport that hands requests straight to a [`Dispatcher`]
#[derive(Clone)]
pub struct Loopback {
    dispatcher: Arc<Dispatcher>,
}

impl Loopback {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn from_arc(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

#[async_trait]
impl Transport for Loopback {
    async fn invoke(&self, opnum: u16, request: Bytes) -> Result<Bytes> {
        trace!("loopback invoke: opnum={}, stub_len={}", opnum, request.len());
        self.dispatcher.dispatch(opnum, request).await
    }
}
