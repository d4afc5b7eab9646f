//! Packet structure and encoding/decoding

use bytes::{BufMut, Bytes, BytesMut};
use byteorder::{BigEndian, ByteOrder};
use std::fmt;
use tracing::trace;

use crate::{
    checksum,
    command::Instruction,
    constants::START_CODE,
    error::{Error, Result},
    status::Status,
};

/// Packet identifier (byte 6 of the frame)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketKind {
    Command = 0x01,
    Data = 0x02,
    Ack = 0x07,
    EndData = 0x08,
}

impl From<PacketKind> for u8 {
    fn from(kind: PacketKind) -> u8 {
        kind as u8
    }
}

impl TryFrom<u8> for PacketKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Command),
            0x02 => Ok(Self::Data),
            0x07 => Ok(Self::Ack),
            0x08 => Ok(Self::EndData),
            _ => Err(Error::UnknownPacketKind(value)),
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Command => "command packet",
            Self::Data => "data packet",
            Self::Ack => "ack packet",
            Self::EndData => "end data packet",
        };
        f.write_str(name)
    }
}

/// Sensor protocol packet
///
/// # Packet Structure
///
/// ```text
/// ┌────────────┬────────────┬──────────┬────────────┬───────────┬────────────┐
/// │ Start code │  Address   │   Type   │   Length   │  Payload  │  Checksum  │
/// │  2 bytes   │  4 bytes   │  1 byte  │  2 bytes   │  N bytes  │  2 bytes   │
/// │  0xEF01    │  (BE u32)  │          │ N+2 (BE)   │           │  (BE u16)  │
/// └────────────┴────────────┴──────────┴────────────┴───────────┴────────────┘
/// ```
///
/// The address belongs to the session, not to the packet, and is supplied
/// when encoding.
///
/// # Examples
///
/// ```
/// use fpsensor_core::{Instruction, Packet, PacketKind};
///
/// let packet = Packet::command(Instruction::ReadImage, &[]);
/// let encoded = packet.encode(0xFFFF_FFFF);
///
/// let decoded = Packet::decode(&encoded).unwrap();
/// assert_eq!(decoded.kind, PacketKind::Command);
/// assert_eq!(decoded.payload, packet.payload);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet type
    pub kind: PacketKind,

    /// Packet payload (instruction and parameters, status and results, or data)
    pub payload: Bytes,
}

impl Packet {
    /// Start code, address, type and length
    pub const HEADER_SIZE: usize = 9;

    pub const CHECKSUM_SIZE: usize = 2;

    /// Smallest frame the decoder inspects (an ack carrying only a status)
    pub const MIN_SIZE: usize = 12;

    /// Maximum payload size
    pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize - Self::CHECKSUM_SIZE;

    /// Create a new packet with empty payload
    pub fn new(kind: PacketKind) -> Self {
        Self {
            kind,
            payload: Bytes::new(),
        }
    }

    /// Create a packet with payload
    pub fn with_payload(kind: PacketKind, payload: impl Into<Bytes>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Create a command packet: instruction code followed by its parameters
    ///
    /// # Examples
    ///
    /// ```
    /// use fpsensor_core::{Instruction, Packet};
    ///
    /// let packet = Packet::command(Instruction::VerifyPassword, &0u32.to_be_bytes());
    /// assert_eq!(packet.payload.as_ref(), &[0x13, 0, 0, 0, 0]);
    /// ```
    pub fn command(instruction: Instruction, params: &[u8]) -> Self {
        let mut payload = BytesMut::with_capacity(1 + params.len());
        payload.put_u8(instruction.into());
        payload.put_slice(params);

        Self::with_payload(PacketKind::Command, payload.freeze())
    }

    /// Value of the length field: payload plus checksum
    pub fn length_field(&self) -> u16 {
        (self.payload.len() + Self::CHECKSUM_SIZE) as u16
    }

    /// Calculate checksum for this packet
    pub fn checksum(&self) -> u16 {
        checksum::calculate(self.kind.into(), self.length_field(), &self.payload)
    }

    /// Encode packet to bytes
    ///
    /// # Examples
    ///
    /// ```
    /// use fpsensor_core::{Packet, PacketKind};
    ///
    /// let packet = Packet::with_payload(PacketKind::Ack, vec![0x00]);
    /// let bytes = packet.encode(0xFFFF_FFFF);
    /// assert_eq!(
    ///     bytes.as_ref(),
    ///     &[0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 0x00, 0x03, 0x00, 0x00, 0x0A]
    /// );
    /// ```
    pub fn encode(&self, address: u32) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_u16(START_CODE);
        buf.put_u32(address);
        buf.put_u8(self.kind.into());
        buf.put_u16(self.length_field());
        buf.put_slice(&self.payload);
        buf.put_u16(self.checksum());

        buf
    }

    /// Decode one complete packet from bytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Buffer is shorter than the frame it announces
    /// - Start code, length or type byte is invalid
    /// - Checksum verification fails
    /// - Bytes remain after the frame
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut decoder = PacketDecoder::new();
        decoder.push(buf);

        match decoder.next_packet()? {
            Some(packet) if decoder.buffered() == 0 => Ok(packet),
            Some(_) => Err(Error::TrailingBytes(decoder.buffered())),
            None => {
                let announced = if buf.len() >= Self::HEADER_SIZE {
                    Self::HEADER_SIZE + BigEndian::read_u16(&buf[7..9]) as usize
                } else {
                    0
                };
                Err(Error::PacketTooShort {
                    expected: announced.max(Self::MIN_SIZE),
                    actual: buf.len(),
                })
            }
        }
    }

    /// Confirmation code of an ack packet
    pub fn status(&self) -> Option<Status> {
        self.payload.first().map(|code| Status::from(*code))
    }

    /// Require a specific packet type
    pub fn expect_kind(&self, expected: PacketKind) -> Result<()> {
        if self.kind != expected {
            return Err(Error::UnexpectedPacket {
                expected,
                actual: self.kind,
            });
        }
        Ok(())
    }

    pub fn is_ack(&self) -> bool {
        self.kind == PacketKind::Ack
    }

    /// Check if this is a data or end-of-data packet
    pub fn is_data(&self) -> bool {
        matches!(self.kind, PacketKind::Data | PacketKind::EndData)
    }

    /// Get total packet size
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len() + Self::CHECKSUM_SIZE
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("kind", &self.kind)
            .field("checksum", &format!("0x{:04X}", self.checksum()))
            .field("payload_len", &self.payload.len())
            .field("payload", &hex::encode(&self.payload[..self.payload.len().min(16)]))
            .finish()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packet[{}](len={})", self.kind, self.payload.len())
    }
}

/// Incremental packet decoder
///
/// Bytes arrive from the transport in arbitrary chunks; the decoder keeps
/// them until a whole frame is present. Bytes after a complete frame stay
/// buffered for the next call, so back-to-back data packets delivered in a
/// single read are not lost.
///
/// Any framing error clears the buffer.
#[derive(Debug, Default)]
pub struct PacketDecoder {
    buffer: BytesMut,
}

impl PacketDecoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(1024),
        }
    }

    /// Append received bytes
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Number of bytes waiting to be decoded
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Try to extract the next packet
    ///
    /// Returns:
    /// - `Ok(Some(packet))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` on a bad start code, length, checksum or type byte
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        if self.buffer.len() < Packet::MIN_SIZE {
            return Ok(None);
        }

        let start = BigEndian::read_u16(&self.buffer[0..2]);
        if start != START_CODE {
            return self.fail(Error::InvalidStartCode { received: start });
        }

        let length = BigEndian::read_u16(&self.buffer[7..9]);
        if (length as usize) < Packet::CHECKSUM_SIZE {
            return self.fail(Error::InvalidLength(length));
        }

        let total = Packet::HEADER_SIZE + length as usize;
        if self.buffer.len() < total {
            return Ok(None);
        }

        let frame = self.buffer.split_to(total).freeze();
        let kind_raw = frame[6];
        let payload = frame.slice(Packet::HEADER_SIZE..total - Packet::CHECKSUM_SIZE);

        let received = BigEndian::read_u16(&frame[total - Packet::CHECKSUM_SIZE..]);
        let expected = checksum::calculate(kind_raw, length, &payload);
        if received != expected {
            return self.fail(Error::ChecksumMismatch { expected, received });
        }

        let kind = match PacketKind::try_from(kind_raw) {
            Ok(kind) => kind,
            Err(e) => return self.fail(e),
        };

        trace!(
            kind = %kind,
            len = payload.len(),
            leftover = self.buffer.len(),
            "Decoded packet"
        );

        Ok(Some(Packet { kind, payload }))
    }

    fn fail(&mut self, error: Error) -> Result<Option<Packet>> {
        trace!(buffered = self.buffer.len(), "Discarding buffer: {}", error);
        self.buffer.clear();
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const ADDRESS: u32 = 0xFFFF_FFFF;

    fn kinds() -> impl Strategy<Value = PacketKind> {
        prop_oneof![
            Just(PacketKind::Command),
            Just(PacketKind::Data),
            Just(PacketKind::Ack),
            Just(PacketKind::EndData),
        ]
    }

    #[test]
    fn test_packet_command() {
        let packet = Packet::command(Instruction::TemplateIndex, &[0x02]);
        assert_eq!(packet.kind, PacketKind::Command);
        assert_eq!(packet.payload.as_ref(), &[0x1F, 0x02]);
    }

    #[test]
    fn test_encode_verify_password() {
        let packet = Packet::command(Instruction::VerifyPassword, &0u32.to_be_bytes());
        let encoded = packet.encode(ADDRESS);

        assert_eq!(
            encoded.as_ref(),
            &[
                0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x00, 0x07, 0x13, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x1B
            ]
        );
    }

    #[test]
    fn test_encode_uses_address() {
        let encoded = Packet::new(PacketKind::Ack).encode(0x1234_5678);
        assert_eq!(&encoded[2..6], &[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_packet_encode_decode() {
        let original = Packet::with_payload(PacketKind::Data, vec![1, 2, 3, 4]);

        let encoded = original.encode(ADDRESS);
        let decoded = Packet::decode(&encoded).unwrap();

        assert_eq!(original, decoded);
    }

    #[test]
    fn test_packet_checksum_verification() {
        let packet = Packet::with_payload(PacketKind::Ack, vec![0x00]);
        let mut encoded = packet.encode(ADDRESS);

        // Corrupt checksum (last two bytes)
        let len = encoded.len();
        encoded[len - 1] ^= 0xFF;

        let result = Packet::decode(&encoded);

        if let Err(Error::ChecksumMismatch { expected, received }) = result {
            assert_ne!(expected, received);
        } else {
            panic!("Expected ChecksumMismatch error");
        }
    }

    #[test]
    fn test_invalid_start_code() {
        let mut encoded = Packet::with_payload(PacketKind::Ack, vec![0x00]).encode(ADDRESS);
        encoded[0] = 0xEE;

        let result = Packet::decode(&encoded);
        assert!(matches!(result, Err(Error::InvalidStartCode { received: 0xEE01 })));
    }

    #[test]
    fn test_packet_too_short() {
        let result = Packet::decode(&[0xEF, 0x01, 0xFF]);
        assert!(matches!(
            result,
            Err(Error::PacketTooShort { expected: 12, actual: 3 })
        ));
    }

    #[test]
    fn test_truncated_frame_reports_announced_size() {
        let encoded = Packet::with_payload(PacketKind::Data, vec![0xAB; 20]).encode(ADDRESS);
        let result = Packet::decode(&encoded[..15]);

        assert!(matches!(
            result,
            Err(Error::PacketTooShort { expected: 31, actual: 15 })
        ));
    }

    #[test]
    fn test_unknown_kind() {
        let mut frame = vec![0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x05, 0x00, 0x03, 0x00];
        let checksum = checksum::calculate(0x05, 3, &[0x00]);
        frame.extend_from_slice(&checksum.to_be_bytes());

        assert!(matches!(Packet::decode(&frame), Err(Error::UnknownPacketKind(0x05))));
    }

    #[test]
    fn test_invalid_length() {
        let frame = [0xEF, 0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 0x00, 0x01, 0x00, 0x00, 0x00];
        assert!(matches!(Packet::decode(&frame), Err(Error::InvalidLength(1))));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut encoded = Packet::with_payload(PacketKind::Ack, vec![0x00]).encode(ADDRESS);
        encoded.extend_from_slice(&[0xEF]);

        assert!(matches!(Packet::decode(&encoded), Err(Error::TrailingBytes(1))));
    }

    #[test]
    fn test_decoder_byte_at_a_time() {
        let encoded = Packet::with_payload(PacketKind::Ack, vec![0x00, 0x00, 0x05, 0x00, 0x64])
            .encode(ADDRESS);
        let mut decoder = PacketDecoder::new();

        for byte in &encoded[..encoded.len() - 1] {
            decoder.push(&[*byte]);
            assert!(decoder.next_packet().unwrap().is_none());
        }

        decoder.push(&encoded[encoded.len() - 1..]);
        let packet = decoder.next_packet().unwrap().unwrap();

        assert_eq!(packet.payload.as_ref(), &[0x00, 0x00, 0x05, 0x00, 0x64]);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_decoder_back_to_back_frames() {
        let mut stream = BytesMut::new();
        stream.extend_from_slice(&Packet::with_payload(PacketKind::Data, vec![1, 2]).encode(ADDRESS));
        stream.extend_from_slice(&Packet::with_payload(PacketKind::EndData, vec![3]).encode(ADDRESS));

        let mut decoder = PacketDecoder::new();
        decoder.push(&stream);

        let first = decoder.next_packet().unwrap().unwrap();
        let second = decoder.next_packet().unwrap().unwrap();

        assert_eq!(first.kind, PacketKind::Data);
        assert_eq!(second.kind, PacketKind::EndData);
        assert_eq!(second.payload.as_ref(), &[3]);
        assert!(decoder.next_packet().unwrap().is_none());
    }

    #[test]
    fn test_empty_payload_frame_waits_for_more_bytes() {
        let end = Packet::new(PacketKind::EndData).encode(ADDRESS);
        assert_eq!(end.len(), Packet::MIN_SIZE - 1);

        // Below the 12-byte minimum a lone frame is never decoded
        assert!(matches!(
            Packet::decode(&end),
            Err(Error::PacketTooShort { expected: 12, actual: 11 })
        ));

        let mut decoder = PacketDecoder::new();
        decoder.push(&end);
        assert!(decoder.next_packet().unwrap().is_none());
        assert_eq!(decoder.buffered(), 11);

        // Any following bytes release it
        decoder.push(&Packet::with_payload(PacketKind::Ack, vec![0x00]).encode(ADDRESS));
        let first = decoder.next_packet().unwrap().unwrap();
        assert_eq!(first.kind, PacketKind::EndData);
        assert!(first.payload.is_empty());
        assert_eq!(decoder.next_packet().unwrap().unwrap().kind, PacketKind::Ack);
    }

    #[test]
    fn test_decoder_clears_after_error() {
        let mut decoder = PacketDecoder::new();
        decoder.push(&[0x00; 20]);

        assert!(decoder.next_packet().is_err());
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_status_and_expect_kind() {
        let ack = Packet::with_payload(PacketKind::Ack, vec![0x09]);
        assert_eq!(ack.status(), Some(Status::NoTemplateFound));
        assert!(ack.expect_kind(PacketKind::Ack).is_ok());
        assert!(matches!(
            ack.expect_kind(PacketKind::Data),
            Err(Error::UnexpectedPacket { .. })
        ));
        assert_eq!(Packet::new(PacketKind::Ack).status(), None);
    }

    proptest! {
        // Empty payloads fall below the decoder minimum, see
        // test_empty_payload_frame_waits_for_more_bytes
        #[test]
        fn prop_round_trip(kind in kinds(), address: u32, payload in prop::collection::vec(any::<u8>(), 1..300)) {
            let packet = Packet::with_payload(kind, payload);
            let decoded = Packet::decode(&packet.encode(address)).unwrap();
            prop_assert_eq!(decoded, packet);
        }

        #[test]
        fn prop_length_field(kind in kinds(), payload in prop::collection::vec(any::<u8>(), 0..300)) {
            let packet = Packet::with_payload(kind, payload.clone());
            let encoded = packet.encode(ADDRESS);
            let length = BigEndian::read_u16(&encoded[7..9]) as usize;

            prop_assert_eq!(length, payload.len() + 2);
            prop_assert_eq!(encoded.len(), Packet::HEADER_SIZE + length);
        }

        #[test]
        fn prop_single_byte_corruption_detected(
            kind in kinds(),
            payload in prop::collection::vec(any::<u8>(), 1..64),
            position in any::<prop::sample::Index>(),
            mask in 1u8..=255,
        ) {
            let mut encoded = Packet::with_payload(kind, payload).encode(ADDRESS);

            // Type, length, payload and checksum bytes
            let covered = 6..encoded.len();
            let index = covered.start + position.index(covered.len());
            encoded[index] ^= mask;

            prop_assert!(Packet::decode(&encoded).is_err());
        }
    }
}
