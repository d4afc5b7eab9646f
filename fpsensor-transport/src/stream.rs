//! Generic async stream transport
//!
//! Wraps anything that is `AsyncRead + AsyncWrite`: a TCP connection to a
//! serial-over-network bridge, one end of a `tokio::io::duplex` pipe, or a
//! serial port opened elsewhere.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::{error::*, Transport};

/// Read whatever is available, bounded by `wait`
pub(crate) async fn read_available<R>(reader: &mut R, wait: Duration) -> Result<BytesMut>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = BytesMut::with_capacity(1024);

    let n = timeout(wait, reader.read_buf(&mut buf))
        .await
        .map_err(|_| {
            warn!("Read timeout after {:?}", wait);
            Error::ReadTimeout
        })?
        .map_err(Error::Io)?;

    if n == 0 {
        return Err(Error::ConnectionClosed);
    }

    trace!("Received {} bytes: {}", n, hex::encode(&buf[..n.min(32)]));

    Ok(buf)
}

/// Write all bytes and flush
pub(crate) async fn write_frame<W>(writer: &mut W, data: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    trace!("Sending {} bytes: {}", data.len(), hex::encode(&data[..data.len().min(32)]));

    writer.write_all(data).await?;
    writer.flush().await?;

    Ok(())
}

/// Transport over any async byte stream
///
/// Single use: `disconnect` shuts the stream down and drops it, so a later
/// `connect` fails with [`Error::ConnectionClosed`]. Build a new transport
/// (for example with [`StreamTransport::tcp`]) to talk to the sensor again.
pub struct StreamTransport<S> {
    stream: Option<S>,
    connected: bool,
    label: String,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + Sync,
{
    /// Wrap an already open stream
    ///
    /// The transport still has to be connected before use.
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(stream),
            connected: false,
            label: "stream".to_string(),
        }
    }

    /// Set the name reported by [`Transport::remote_addr`]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Access the underlying stream
    pub fn get_ref(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    fn stream_mut(&mut self) -> Result<&mut S> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.stream.as_mut().ok_or(Error::NotConnected)
    }
}

impl StreamTransport<TcpStream> {
    /// Open a TCP connection to a serial bridge
    pub async fn tcp(addr: &str, connect_timeout: Duration) -> Result<Self> {
        let remote = resolve_addr(addr).await?;

        debug!("Connecting to {}...", remote);

        let stream = timeout(connect_timeout, TcpStream::connect(remote))
            .await
            .map_err(|_| Error::ConnectionTimeout)?
            .map_err(Error::Io)?;

        // Frames are small; do not let Nagle hold them back
        stream.set_nodelay(true)?;

        debug!("Connected to {}", remote);

        Ok(Self::new(stream).with_label(remote.to_string()))
    }
}

async fn resolve_addr(addr: &str) -> Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(addr)
        .await
        .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr, e)))?
        .collect();

    addrs
        .first()
        .copied()
        .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", addr)))
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + Sync,
{
    async fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Err(Error::AlreadyConnected);
        }
        if self.stream.is_none() {
            return Err(Error::ConnectionClosed);
        }

        debug!("Stream transport {} ready", self.label);
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Disconnecting from {}...", self.label);

            // Graceful shutdown
            let _ = stream.shutdown().await;
        }

        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected && self.stream.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream_mut()?;
        write_frame(stream, data).await
    }

    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut> {
        let stream = self.stream_mut()?;
        read_available(stream, timeout).await
    }

    fn remote_addr(&self) -> String {
        self.label.clone()
    }
}

impl<S> Drop for StreamTransport<S> {
    fn drop(&mut self) {
        if self.connected && self.stream.is_some() {
            warn!("Stream transport {} dropped while still connected", self.label);
        }
    }
}
