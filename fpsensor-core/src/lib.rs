//! # fpsensor-core
//!
//! Core protocol implementation for ZFM/R30x/R50x fingerprint sensors.
//!
//! This crate provides the low-level protocol primitives:
//! - Packet structure and encoding/decoding
//! - Checksum calculation
//! - Instruction and confirmation code tables
//! - Session state
//! - Protocol constants

pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod packet;
pub mod session;
pub mod status;

pub use command::Instruction;
pub use error::{Error, Result};
pub use packet::{Packet, PacketDecoder, PacketKind};
pub use session::{Session, SessionState};
pub use status::Status;
