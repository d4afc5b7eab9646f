//! Error types for fpsensor-core

use crate::{command::Instruction, packet::PacketKind, status::Status};

/// Result type alias for fpsensor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Packet is too short to be valid
    #[error("Packet too short: expected at least {expected} bytes, got {actual} bytes")]
    PacketTooShort {
        expected: usize,
        actual: usize,
    },

    /// Frame does not begin with 0xEF01
    #[error("The received packet does not begin with a valid header (0x{received:04X})")]
    InvalidStartCode {
        received: u16,
    },

    /// Length field cannot even hold the checksum
    #[error("Invalid packet length field: {0}")]
    InvalidLength(u16),

    /// Checksum verification failed
    #[error("The received packet is corrupted: checksum expected 0x{expected:04X}, received 0x{received:04X}")]
    ChecksumMismatch {
        expected: u16,
        received: u16,
    },

    /// Unknown packet type byte
    #[error("Unknown packet type: 0x{0:02X}")]
    UnknownPacketKind(u8),

    /// Packet of the wrong type for this point of the exchange
    #[error("Unexpected packet: expected {expected}, got {actual}")]
    UnexpectedPacket {
        expected: PacketKind,
        actual: PacketKind,
    },

    /// Bytes left over after a complete packet
    #[error("{0} trailing bytes after packet")]
    TrailingBytes(usize),

    /// Sensor returned a status that is fatal for this instruction
    #[error("{instruction} failed: {status}")]
    Device {
        instruction: Instruction,
        status: Status,
    },

    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    /// Session not initialized
    #[error("Session not initialized - verify the sensor password first")]
    SessionNotInitialized,

    /// Payload too large
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },
}

impl Error {
    /// Check if error comes from packet framing (header, checksum, type)
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            Self::PacketTooShort { .. }
                | Self::InvalidStartCode { .. }
                | Self::InvalidLength(_)
                | Self::ChecksumMismatch { .. }
                | Self::UnknownPacketKind(_)
                | Self::UnexpectedPacket { .. }
                | Self::TrailingBytes(_)
        )
    }

    /// Check if error is recoverable (reissuing the whole command might succeed)
    pub fn is_recoverable(&self) -> bool {
        self.is_framing() || matches!(self, Self::Device { .. })
    }
}
