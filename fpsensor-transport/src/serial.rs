//! Serial port transport

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::AsyncWriteExt;
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, warn};

use crate::{
    error::*,
    stream::{read_available, write_frame},
    Transport,
};

/// Factory default baud rate of the sensor family
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// UART transport (8 data bits, no parity, one stop bit)
pub struct SerialTransport {
    port_name: String,
    baud_rate: u32,
    port_timeout: Duration,
    port: Option<SerialStream>,
}

impl SerialTransport {
    /// Create new serial transport, e.g. `/dev/ttyUSB0` or `COM3`
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            port_timeout: Duration::from_secs(5),
            port: None,
        }
    }

    /// Set baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the driver-level port timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.port_timeout = timeout;
        self
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Names of the serial ports present on this machine
    pub fn available_ports() -> Result<Vec<String>> {
        Ok(tokio_serial::available_ports()?
            .into_iter()
            .map(|port| port.port_name)
            .collect())
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        debug!("Opening {} at {} baud...", self.port_name, self.baud_rate);

        let port = tokio_serial::new(self.port_name.clone(), self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(self.port_timeout)
            .open_native_async()?;

        debug!("Opened {}", self.port_name);

        self.port = Some(port);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            debug!("Closing {}...", self.port_name);
            let _ = port.shutdown().await;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        write_frame(port, data).await
    }

    async fn receive(&mut self, timeout: Duration) -> Result<BytesMut> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        read_available(port, timeout).await
    }

    fn remote_addr(&self) -> String {
        format!("{}@{}", self.port_name, self.baud_rate)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("Serial transport dropped while still connected");
        }
    }
}
