//! # fpsensor
//!
//! Driver for ZFM/R30x/R50x fingerprint sensors speaking the `0xEF01`
//! packet protocol.
//!
//! ## Features
//!
//! - Async/await API using Tokio
//! - Serial, generic stream and in-memory transports
//! - Expected negative outcomes (no finger, no match) as plain values
//! - Enrollment, search and image capture workflows with bounded,
//!   cancellable finger polling
//!
//! ## Quick Start
//!
//! ```no_run
//! use fpsensor::{Enrollment, Sensor};
//!
//! #[tokio::main]
//! async fn main() -> fpsensor::Result<()> {
//!     let mut sensor = Sensor::serial("/dev/ttyUSB0", 57_600);
//!     sensor.open().await?;
//!
//!     match sensor.enroll_fingerprint(|prompt| println!("{}", prompt)).await? {
//!         Enrollment::Enrolled(position) => println!("New template #{}", position),
//!         Enrollment::AlreadyEnrolled(position) => println!("Known as #{}", position),
//!     }
//!
//!     sensor.close().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod sensor;
pub mod slots;
pub mod transfer;
pub mod workflow;

// Re-exports
pub use config::{SensorConfig, WaitPolicy};
pub use error::{Error, Result};
pub use sensor::{Sensor, SystemParameter};
pub use workflow::{EnrollState, Enrollment, Prompt};

// Re-export lower layers
pub use fpsensor_core::{Instruction, Packet, PacketKind, Session, SessionState, Status};
pub use fpsensor_transport::{MemoryTransport, SerialTransport, StreamTransport, Transport};
pub use fpsensor_types::{
    BaudRate, CharBuffer, FingerprintImage, PacketSize, SecurityLevel, StorageUsage,
    SystemParameters, TemplateIndex, TemplateMatch,
};
pub use tokio_util::sync::CancellationToken;
