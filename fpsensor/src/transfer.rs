//! Multi-packet data transfers
//!
//! Images and characteristics do not fit in one packet. After the command
//! is acknowledged the payload travels as a run of data packets closed by
//! an end-of-data packet.

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use fpsensor_core::{Packet, PacketKind};
use fpsensor_transport::Transport;

use crate::error::Result;
use crate::sensor::Sensor;

/// Split `data` into packets of at most `max_packet_size` bytes
///
/// Every packet but the last is a data packet; the last is the end packet.
///
/// # Examples
///
/// ```
/// use fpsensor::transfer::data_packets;
/// use fpsensor_core::PacketKind;
///
/// let packets = data_packets(&[1, 2, 3, 4, 5], 2);
/// let kinds: Vec<_> = packets.iter().map(|p| p.kind).collect();
/// assert_eq!(kinds, [PacketKind::Data, PacketKind::Data, PacketKind::EndData]);
/// ```
pub fn data_packets(data: &[u8], max_packet_size: usize) -> Vec<Packet> {
    let data = Bytes::copy_from_slice(data);
    let chunk_size = max_packet_size.max(1);
    let total = data.len().div_ceil(chunk_size);

    (0..total)
        .map(|index| {
            let start = index * chunk_size;
            let end = (start + chunk_size).min(data.len());
            let kind = if index + 1 == total {
                PacketKind::EndData
            } else {
                PacketKind::Data
            };
            Packet::with_payload(kind, data.slice(start..end))
        })
        .collect()
}

impl<T: Transport> Sensor<T> {
    /// Collect data packets until the end packet arrives
    pub(crate) async fn receive_data(&mut self) -> Result<BytesMut> {
        let mut data = BytesMut::new();
        let mut packets = 0usize;

        loop {
            let packet = self.receive_packet().await?;
            if !packet.is_data() {
                self.decoder.clear();
                return Err(fpsensor_core::Error::UnexpectedPacket {
                    expected: PacketKind::Data,
                    actual: packet.kind,
                }
                .into());
            }

            packets += 1;
            trace!("Data packet {} ({} bytes)", packets, packet.payload.len());
            data.extend_from_slice(&packet.payload);

            if packet.kind == PacketKind::EndData {
                break;
            }
        }

        debug!("Received {} bytes in {} packets", data.len(), packets);
        Ok(data)
    }

    /// Send `data` as a run of data packets
    pub(crate) async fn send_data(&mut self, data: &[u8], max_packet_size: usize) -> Result<()> {
        let packets = data_packets(data, max_packet_size);
        let count = packets.len();

        for packet in &packets {
            self.send_packet(packet).await?;
        }

        debug!("Sent {} bytes in {} packets", data.len(), count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_chunk_is_end_packet() {
        let packets = data_packets(&[1, 2, 3], 32);

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].kind, PacketKind::EndData);
        assert_eq!(packets[0].payload.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_exact_multiple() {
        let data: Vec<u8> = (0..128).collect();
        let packets = data_packets(&data, 64);

        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].kind, PacketKind::Data);
        assert_eq!(packets[1].kind, PacketKind::EndData);
        assert_eq!(packets[1].payload.len(), 64);
    }

    #[test]
    fn test_chunks_preserve_order() {
        let data: Vec<u8> = (0..=200).collect();
        let packets = data_packets(&data, 64);

        assert_eq!(packets.len(), 4);
        assert!(packets.iter().all(|p| p.payload.len() <= 64));

        let joined: Vec<u8> = packets
            .iter()
            .flat_map(|p| p.payload.iter().copied())
            .collect();
        assert_eq!(joined, data);
    }

    #[test]
    fn test_empty_data() {
        assert!(data_packets(&[], 32).is_empty());
    }
}
