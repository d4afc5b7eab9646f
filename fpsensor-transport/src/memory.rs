//! In-memory transport
//!
//! Replays scripted inbound chunks and records every outbound write. A
//! [`MemoryHandle`] shares the same state so a test can queue sensor
//! replies and inspect what the host sent after the transport has been
//! moved into a sensor.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tracing::trace;

use crate::{error::*, Transport};

#[derive(Debug, Default)]
struct MemoryState {
    connected: bool,
    inbound: VecDeque<Bytes>,
    outbound: Vec<Bytes>,
}

/// Scripted transport
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

/// Shared view of a [`MemoryTransport`]
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a handle sharing this transport's state
    pub fn handle(&self) -> MemoryHandle {
        MemoryHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl MemoryHandle {
    /// Queue one chunk to be returned by a single `receive`
    pub fn push_inbound(&self, chunk: impl Into<Bytes>) {
        self.state.lock().inbound.push_back(chunk.into());
    }

    /// Number of queued chunks not yet received
    pub fn pending_inbound(&self) -> usize {
        self.state.lock().inbound.len()
    }

    /// Every write made so far, in order
    pub fn sent(&self) -> Vec<Bytes> {
        self.state.lock().outbound.clone()
    }

    /// Number of writes made so far
    pub fn sent_count(&self) -> usize {
        self.state.lock().outbound.len()
    }

    /// Forget recorded writes
    pub fn clear_sent(&self) {
        self.state.lock().outbound.clear();
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.connected {
            return Err(Error::AlreadyConnected);
        }
        state.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.state.lock().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(Error::NotConnected);
        }

        trace!("Recording {} bytes: {}", data.len(), hex::encode(&data[..data.len().min(32)]));
        state.outbound.push(Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut> {
        let next = {
            let mut state = self.state.lock();
            if !state.connected {
                return Err(Error::NotConnected);
            }
            state.inbound.pop_front()
        };

        match next {
            Some(chunk) => Ok(BytesMut::from(chunk.as_ref())),
            None => {
                // Nothing scripted: behave like a silent line
                tokio::time::sleep(timeout).await;
                Err(Error::ReadTimeout)
            }
        }
    }

    fn remote_addr(&self) -> String {
        "memory".to_string()
    }
}
