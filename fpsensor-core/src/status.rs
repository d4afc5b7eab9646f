//! Confirmation codes
//!
//! The first payload byte of every acknowledgment packet.

use std::fmt;

/// Sensor confirmation code
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    CommunicationError,
    NoFinger,
    ReadImageError,
    MessyImage,
    FewFeaturePoints,
    NotMatching,
    NoTemplateFound,
    CharacteristicsMismatch,
    InvalidPosition,
    LoadTemplateError,
    DownloadCharacteristicsError,
    PacketResponseFail,
    DownloadImageError,
    DeleteFailed,
    ClearFailed,
    WrongPassword,
    InvalidImage,
    FlashError,
    Undefined,
    InvalidRegister,
    WrongAddress,
    PasswordRequired,
    BadPacket,
    Timeout,
    Unknown(u8),
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::CommunicationError => 0x01,
            Self::NoFinger => 0x02,
            Self::ReadImageError => 0x03,
            Self::MessyImage => 0x06,
            Self::FewFeaturePoints => 0x07,
            Self::NotMatching => 0x08,
            Self::NoTemplateFound => 0x09,
            Self::CharacteristicsMismatch => 0x0A,
            Self::InvalidPosition => 0x0B,
            Self::LoadTemplateError => 0x0C,
            Self::DownloadCharacteristicsError => 0x0D,
            Self::PacketResponseFail => 0x0E,
            Self::DownloadImageError => 0x0F,
            Self::DeleteFailed => 0x10,
            Self::ClearFailed => 0x11,
            Self::WrongPassword => 0x13,
            Self::InvalidImage => 0x15,
            Self::FlashError => 0x18,
            Self::Undefined => 0x19,
            Self::InvalidRegister => 0x1A,
            Self::WrongAddress => 0x20,
            Self::PasswordRequired => 0x21,
            Self::BadPacket => 0xFE,
            Self::Timeout => 0xFF,
            Self::Unknown(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Human readable description
    pub fn description(self) -> &'static str {
        match self {
            Self::Ok => "Command executed",
            Self::CommunicationError => "Communication error",
            Self::NoFinger => "No finger on the sensor",
            Self::ReadImageError => "Could not read image",
            Self::MessyImage => "The image is too messy",
            Self::FewFeaturePoints => "The image contains too few feature points",
            Self::NotMatching => "The characteristics do not match",
            Self::NoTemplateFound => "No matching template found",
            Self::CharacteristicsMismatch => "Could not combine the char buffers",
            Self::InvalidPosition => "Position beyond the template store",
            Self::LoadTemplateError => "The template could not be read",
            Self::DownloadCharacteristicsError => "Could not download characteristics",
            Self::PacketResponseFail => "Could not receive the following data packets",
            Self::DownloadImageError => "Could not download image",
            Self::DeleteFailed => "Could not delete template",
            Self::ClearFailed => "Could not clear the template store",
            Self::WrongPassword => "Wrong password",
            Self::InvalidImage => "No valid image in the image buffer",
            Self::FlashError => "Error writing to flash",
            Self::Undefined => "Undefined error",
            Self::InvalidRegister => "Invalid register number",
            Self::WrongAddress => "Wrong address",
            Self::PasswordRequired => "Password must be verified first",
            Self::BadPacket => "Bad packet",
            Self::Timeout => "Timeout",
            Self::Unknown(_) => "Unknown error",
        }
    }
}

impl From<u8> for Status {
    fn from(code: u8) -> Self {
        match code {
            0x00 => Self::Ok,
            0x01 => Self::CommunicationError,
            0x02 => Self::NoFinger,
            0x03 => Self::ReadImageError,
            0x06 => Self::MessyImage,
            0x07 => Self::FewFeaturePoints,
            0x08 => Self::NotMatching,
            0x09 => Self::NoTemplateFound,
            0x0A => Self::CharacteristicsMismatch,
            0x0B => Self::InvalidPosition,
            0x0C => Self::LoadTemplateError,
            0x0D => Self::DownloadCharacteristicsError,
            0x0E => Self::PacketResponseFail,
            0x0F => Self::DownloadImageError,
            0x10 => Self::DeleteFailed,
            0x11 => Self::ClearFailed,
            0x13 => Self::WrongPassword,
            0x15 => Self::InvalidImage,
            0x18 => Self::FlashError,
            0x19 => Self::Undefined,
            0x1A => Self::InvalidRegister,
            0x20 => Self::WrongAddress,
            0x21 => Self::PasswordRequired,
            0xFE => Self::BadPacket,
            0xFF => Self::Timeout,
            other => Self::Unknown(other),
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status.code()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.description(), self.code())
    }
}
