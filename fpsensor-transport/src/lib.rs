//! Transport layer for the sensor protocol
//!
//! The protocol only needs "write these bytes" and "give me whatever bytes
//! arrive within a bounded wait". Adapters:
//! - [`SerialTransport`]: a UART through tokio-serial
//! - [`StreamTransport`]: any async byte stream (TCP serial bridge, duplex pipe)
//! - [`MemoryTransport`]: scripted replies for tests and simulators

pub mod error;
pub mod memory;
pub mod serial;
pub mod stream;

pub use error::{Error, Result};
pub use memory::{MemoryHandle, MemoryTransport};
pub use serial::SerialTransport;
pub use stream::StreamTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

/// Transport trait for different communication methods
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the link
    async fn connect(&mut self) -> Result<()>;

    /// Close the link
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send raw bytes
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive whatever bytes are available, at least one
    ///
    /// Fails with [`Error::ReadTimeout`] when nothing arrives within `timeout`.
    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut>;

    /// Human readable peer (port name, socket address)
    fn remote_addr(&self) -> String;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn connect(&mut self) -> Result<()> {
        (**self).connect().await
    }

    async fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect().await
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        (**self).send(data).await
    }

    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut> {
        (**self).receive(timeout).await
    }

    fn remote_addr(&self) -> String {
        (**self).remote_addr()
    }
}
