//! System parameter structures

use std::fmt;

use bitflags::bitflags;
use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

bitflags! {
    /// Sensor status register (first word of the system parameters)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister: u16 {
        /// The sensor is executing a command
        const BUSY = 1 << 0;
        /// The last search or match found a finger
        const PASS = 1 << 1;
        /// The handshake password has been verified
        const PASSWORD_VERIFIED = 1 << 2;
        /// The image buffer holds a valid capture
        const IMAGE_VALID = 1 << 3;
    }
}

/// Maximum data packet size negotiated with the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketSize {
    Bytes32 = 0,
    Bytes64 = 1,
    Bytes128 = 2,
    Bytes256 = 3,
}

impl PacketSize {
    /// Map a wire size code (0-3) to a packet size
    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            0 => Ok(Self::Bytes32),
            1 => Ok(Self::Bytes64),
            2 => Ok(Self::Bytes128),
            3 => Ok(Self::Bytes256),
            _ => Err(Error::validation(format!("Invalid packet size code: {}", code))),
        }
    }

    /// Map a size in bytes (32, 64, 128 or 256) to a packet size
    pub fn from_bytes(size: usize) -> Result<Self> {
        match size {
            32 => Ok(Self::Bytes32),
            64 => Ok(Self::Bytes64),
            128 => Ok(Self::Bytes128),
            256 => Ok(Self::Bytes256),
            _ => Err(Error::validation(format!("Invalid packet size: {}", size))),
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn bytes(self) -> usize {
        32 << (self as usize)
    }
}

impl fmt::Display for PacketSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes", self.bytes())
    }
}

/// Serial baud rate, always a multiple of 9600
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaudRate(u8);

impl BaudRate {
    pub const STEP: u32 = 9600;

    /// Factory default (57600 baud)
    pub const DEFAULT: Self = Self(6);

    pub fn from_baud(baud: u32) -> Result<Self> {
        if baud % Self::STEP != 0 {
            return Err(Error::validation(format!(
                "Baud rate {} is not a multiple of {}",
                baud,
                Self::STEP
            )));
        }
        Self::from_code((baud / Self::STEP) as u16)
    }

    /// Accepts codes 1-12 (9600 to 115200 baud)
    pub fn from_code(code: u16) -> Result<Self> {
        if !(1..=12).contains(&code) {
            return Err(Error::validation(format!("Invalid baud rate code: {}", code)));
        }
        Ok(Self(code as u8))
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn baud(self) -> u32 {
        self.0 as u32 * Self::STEP
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Matching strictness, 1 (lenient) to 5 (strict)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SecurityLevel(u8);

impl SecurityLevel {
    pub fn new(level: u8) -> Result<Self> {
        if !(1..=5).contains(&level) {
            return Err(Error::validation(format!("Invalid security level: {}", level)));
        }
        Ok(Self(level))
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

/// Snapshot of the sensor's system parameters.
///
/// Returned by the `0x0F` command as sixteen big-endian bytes following
/// the status byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemParameters {
    pub status_register: StatusRegister,

    /// Constant system identifier (0x0009 on most modules)
    pub system_id: u16,

    /// Number of template slots
    pub storage_capacity: u16,

    /// Raw security level (1-5)
    pub security_level: u16,

    /// Address the sensor answers to
    pub sensor_address: u32,

    /// Packet size code (0-3)
    pub packet_size_code: u16,

    /// Baud rate code, multiply by 9600 for the baud rate
    pub baud_rate_code: u16,
}

impl SystemParameters {
    pub const PAYLOAD_SIZE: usize = 16;

    /// Parse the sixteen result bytes of a system parameter response
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        if payload.len() < Self::PAYLOAD_SIZE {
            return Err(Error::parse(format!(
                "System parameters need {} bytes, got {}",
                Self::PAYLOAD_SIZE,
                payload.len()
            )));
        }

        Ok(Self {
            status_register: StatusRegister::from_bits_retain(BigEndian::read_u16(&payload[0..2])),
            system_id: BigEndian::read_u16(&payload[2..4]),
            storage_capacity: BigEndian::read_u16(&payload[4..6]),
            security_level: BigEndian::read_u16(&payload[6..8]),
            sensor_address: BigEndian::read_u32(&payload[8..12]),
            packet_size_code: BigEndian::read_u16(&payload[12..14]),
            baud_rate_code: BigEndian::read_u16(&payload[14..16]),
        })
    }

    pub fn packet_size(&self) -> Result<PacketSize> {
        PacketSize::from_code(self.packet_size_code)
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate_code as u32 * BaudRate::STEP
    }

    pub fn is_busy(&self) -> bool {
        self.status_register.contains(StatusRegister::BUSY)
    }

    pub fn has_finger_match(&self) -> bool {
        self.status_register.contains(StatusRegister::PASS)
    }

    pub fn password_verified(&self) -> bool {
        self.status_register.contains(StatusRegister::PASSWORD_VERIFIED)
    }

    pub fn has_valid_image(&self) -> bool {
        self.status_register.contains(StatusRegister::IMAGE_VALID)
    }
}

impl fmt::Display for SystemParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sensor[addr: 0x{:08X}, capacity: {}, security: {}, baud: {}]",
            self.sensor_address,
            self.storage_capacity,
            self.security_level,
            self.baud_rate()
        )
    }
}

/// Template store usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsage {
    pub used: u16,
    pub total: u16,
}

impl StorageUsage {
    pub fn free(&self) -> u16 {
        self.total.saturating_sub(self.used)
    }
}

impl fmt::Display for StorageUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.used, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_packet_size_codes() {
        assert_eq!(PacketSize::from_code(0).unwrap().bytes(), 32);
        assert_eq!(PacketSize::from_code(3).unwrap().bytes(), 256);
        assert_eq!(PacketSize::from_bytes(128).unwrap(), PacketSize::Bytes128);
        assert_eq!(PacketSize::Bytes64.code(), 1);
    }

    #[test]
    fn test_packet_size_invalid() {
        assert!(matches!(PacketSize::from_code(4), Err(Error::Validation(_))));
        assert!(matches!(PacketSize::from_bytes(100), Err(Error::Validation(_))));
    }

    #[test]
    fn test_baud_rate() {
        let baud = BaudRate::from_baud(57600).unwrap();
        assert_eq!(baud.code(), 6);
        assert_eq!(baud.baud(), 57600);
        assert_eq!(BaudRate::default(), baud);

        assert!(BaudRate::from_baud(57601).is_err());
        assert!(BaudRate::from_baud(0).is_err());
        assert!(BaudRate::from_baud(9600 * 13).is_err());
    }

    #[test]
    fn test_security_level_range() {
        assert!(SecurityLevel::new(0).is_err());
        assert_eq!(SecurityLevel::new(3).unwrap().level(), 3);
        assert!(SecurityLevel::new(6).is_err());
    }

    #[test]
    fn test_system_parameters_from_payload() {
        let payload = [
            0x00, 0x04, // status: password verified
            0x00, 0x09, // system id
            0x00, 0xA3, // capacity 163
            0x00, 0x03, // security level
            0xFF, 0xFF, 0xFF, 0xFF, // address
            0x00, 0x02, // packet size code
            0x00, 0x06, // baud code
        ];

        let params = SystemParameters::from_payload(&payload).unwrap();

        assert_eq!(params.system_id, 9);
        assert_eq!(params.storage_capacity, 163);
        assert_eq!(params.security_level, 3);
        assert_eq!(params.sensor_address, 0xFFFF_FFFF);
        assert_eq!(params.packet_size().unwrap(), PacketSize::Bytes128);
        assert_eq!(params.baud_rate(), 57600);
        assert!(params.password_verified());
        assert!(!params.is_busy());
    }

    #[test]
    fn test_system_parameters_short_payload() {
        let result = SystemParameters::from_payload(&[0; 10]);
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_storage_usage_free() {
        let usage = StorageUsage { used: 10, total: 150 };
        assert_eq!(usage.free(), 140);
        assert_eq!(usage.to_string(), "10 / 150");
    }
}
