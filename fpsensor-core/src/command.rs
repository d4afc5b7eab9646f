//! Sensor instruction codes

use std::fmt;

/// Instruction codes
///
/// The first payload byte of every command packet. Names follow the
/// host's point of view: `DownloadImage` and `DownloadCharacteristics`
/// move data from the sensor to the host, `UploadCharacteristics` moves
/// data from the host to the sensor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Instruction {
    // Image capture
    ReadImage = 0x01,
    ConvertImage = 0x02,
    DownloadImage = 0x0A,

    // Matching
    CompareCharacteristics = 0x03,
    SearchTemplate = 0x04,
    CreateTemplate = 0x05,

    // Template store
    StoreTemplate = 0x06,
    LoadTemplate = 0x07,
    DownloadCharacteristics = 0x08,
    UploadCharacteristics = 0x09,
    DeleteTemplate = 0x0C,
    ClearDatabase = 0x0D,
    TemplateCount = 0x1D,
    TemplateIndex = 0x1F,

    // System
    SetSystemParameter = 0x0E,
    GetSystemParameters = 0x0F,
    SetPassword = 0x12,
    VerifyPassword = 0x13,
    GenerateRandomNumber = 0x14,
    SetAddress = 0x15,
}

impl Instruction {
    /// Get instruction name
    pub fn name(self) -> &'static str {
        match self {
            Self::ReadImage => "ReadImage",
            Self::ConvertImage => "ConvertImage",
            Self::DownloadImage => "DownloadImage",
            Self::CompareCharacteristics => "CompareCharacteristics",
            Self::SearchTemplate => "SearchTemplate",
            Self::CreateTemplate => "CreateTemplate",
            Self::StoreTemplate => "StoreTemplate",
            Self::LoadTemplate => "LoadTemplate",
            Self::DownloadCharacteristics => "DownloadCharacteristics",
            Self::UploadCharacteristics => "UploadCharacteristics",
            Self::DeleteTemplate => "DeleteTemplate",
            Self::ClearDatabase => "ClearDatabase",
            Self::TemplateCount => "TemplateCount",
            Self::TemplateIndex => "TemplateIndex",
            Self::SetSystemParameter => "SetSystemParameter",
            Self::GetSystemParameters => "GetSystemParameters",
            Self::SetPassword => "SetPassword",
            Self::VerifyPassword => "VerifyPassword",
            Self::GenerateRandomNumber => "GenerateRandomNumber",
            Self::SetAddress => "SetAddress",
        }
    }
}

impl From<Instruction> for u8 {
    fn from(instruction: Instruction) -> u8 {
        instruction as u8
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}
