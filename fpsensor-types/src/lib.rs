//! Type definitions for fpsensor

pub mod error;
pub mod image;
pub mod params;
pub mod template;

pub use error::{Error, Result};
pub use image::FingerprintImage;
pub use params::{BaudRate, PacketSize, SecurityLevel, StatusRegister, StorageUsage, SystemParameters};
pub use template::{CharBuffer, TemplateIndex, TemplateMatch};
