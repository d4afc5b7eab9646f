//! High-level error types

use fpsensor_core::Status;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] fpsensor_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] fpsensor_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] fpsensor_types::Error),

    #[error("The given fingerprint sensor password is wrong")]
    WrongPassword,

    #[error("Fingers do not match")]
    FingersDoNotMatch,

    #[error("Template could not be created from the char buffers")]
    TemplateNotCreated,

    #[error("Uploaded characteristics differ from the sensor copy ({sent} bytes sent, {received} bytes read back)")]
    UploadMismatch { sent: usize, received: usize },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("No finger detected after {attempts} attempts")]
    FingerNotDetected { attempts: u32 },

    #[error("Invalid response from sensor: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Check if error is a validation failure caught before any I/O
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Types(fpsensor_types::Error::Validation(_)))
    }

    /// Check if error comes from packet framing
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_framing())
    }

    /// Check if reissuing the operation might succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Core(e) => e.is_recoverable(),
            Self::Transport(fpsensor_transport::Error::ReadTimeout) => true,
            Self::FingersDoNotMatch | Self::FingerNotDetected { .. } | Self::UploadMismatch { .. } => true,
            _ => false,
        }
    }

    /// Confirmation code when the sensor rejected a command
    pub fn device_status(&self) -> Option<Status> {
        match self {
            Self::Core(fpsensor_core::Error::Device { status, .. }) => Some(*status),
            _ => None,
        }
    }
}
