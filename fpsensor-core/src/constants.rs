//! Protocol constants

/// Start code opening every packet (high byte first)
pub const START_CODE: u16 = 0xEF01;

/// Factory default module address
pub const DEFAULT_ADDRESS: u32 = 0xFFFF_FFFF;

/// Factory default handshake password
pub const DEFAULT_PASSWORD: u32 = 0x0000_0000;

/// Default read timeout (seconds)
pub const DEFAULT_READ_TIMEOUT: u64 = 5;

/// Pause between the two captures of an enrollment (milliseconds)
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

/// Parameter numbers of the SetSysPara command
pub mod system_parameter {
    /// Baud rate code (1-12, multiple of 9600)
    pub const BAUD_RATE: u8 = 4;

    /// Security level (1-5)
    pub const SECURITY_LEVEL: u8 = 5;

    /// Data packet size code (0-3)
    pub const PACKET_SIZE: u8 = 6;
}
