#![allow(dead_code)]

use bytes::{Bytes, BytesMut};
use fpsensor::{Instruction, Packet, PacketKind, Sensor, SensorConfig};
use fpsensor_transport::{MemoryHandle, MemoryTransport};

pub const ADDRESS: u32 = 0xFFFF_FFFF;

/// Acknowledgment frame with a confirmation code and result bytes
pub fn ack(status: u8, data: &[u8]) -> Bytes {
    let mut payload = vec![status];
    payload.extend_from_slice(data);
    Packet::with_payload(PacketKind::Ack, payload)
        .encode(ADDRESS)
        .freeze()
}

pub fn ok() -> Bytes {
    ack(0x00, &[])
}

pub fn data(kind: PacketKind, payload: &[u8]) -> Bytes {
    Packet::with_payload(kind, payload.to_vec())
        .encode(ADDRESS)
        .freeze()
}

pub fn command(instruction: Instruction, params: &[u8]) -> Bytes {
    Packet::command(instruction, params).encode(ADDRESS).freeze()
}

/// System parameter reply for a sensor with `capacity` slots
pub fn system_parameters(capacity: u16, packet_size_code: u16) -> Bytes {
    let mut result = BytesMut::new();
    result.extend_from_slice(&0x0000u16.to_be_bytes()); // status register
    result.extend_from_slice(&0x0009u16.to_be_bytes()); // system id
    result.extend_from_slice(&capacity.to_be_bytes());
    result.extend_from_slice(&3u16.to_be_bytes()); // security level
    result.extend_from_slice(&ADDRESS.to_be_bytes());
    result.extend_from_slice(&packet_size_code.to_be_bytes());
    result.extend_from_slice(&6u16.to_be_bytes()); // 57600 baud
    ack(0x00, &result)
}

/// Template index reply: 32 bitmap bytes, the first `used` slots taken
pub fn template_index(used: usize) -> Bytes {
    let mut bitmap = [0u8; 32];
    for slot in 0..used.min(256) {
        bitmap[slot / 8] |= 1 << (slot % 8);
    }
    ack(0x00, &bitmap)
}

/// Instruction byte of every command frame the host sent
pub fn sent_instructions(handle: &MemoryHandle) -> Vec<u8> {
    handle
        .sent()
        .iter()
        .filter(|frame| frame.len() > 9 && frame[6] == u8::from(PacketKind::Command))
        .map(|frame| frame[9])
        .collect()
}

pub async fn open_sensor(config: SensorConfig) -> (Sensor<MemoryTransport>, MemoryHandle) {
    let transport = MemoryTransport::new();
    let handle = transport.handle();
    handle.push_inbound(ok());

    let mut sensor = Sensor::new(transport, config);
    sensor.open().await.expect("handshake");
    handle.clear_sent();

    (sensor, handle)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
