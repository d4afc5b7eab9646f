//! Packet checksum
//!
//! The checksum is the 16-bit sum, modulo 65536, of the packet type byte,
//! both length bytes and every payload byte. It is sent big-endian as the
//! last two bytes of the frame. Start code and address are not covered.

use tracing::trace;

/// Calculate the checksum of a packet
///
/// # Examples
///
/// ```
/// use fpsensor_core::checksum;
///
/// // VfyPwd with password 0: type 0x01, length 7, payload [0x13, 0, 0, 0, 0]
/// let sum = checksum::calculate(0x01, 0x0007, &[0x13, 0, 0, 0, 0]);
/// assert_eq!(sum, 0x001B);
/// ```
pub fn calculate(kind: u8, length: u16, payload: &[u8]) -> u16 {
    let [len_hi, len_lo] = length.to_be_bytes();

    let checksum = payload
        .iter()
        .fold(kind as u16 + len_hi as u16 + len_lo as u16, |sum, byte| {
            sum.wrapping_add(*byte as u16)
        });

    trace!(
        kind = kind,
        length = length,
        payload_len = payload.len(),
        checksum = format!("0x{:04X}", checksum),
        "Calculated checksum"
    );

    checksum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_empty_payload() {
        assert_eq!(calculate(0x07, 0x0002, &[]), 0x0009);
    }

    #[test]
    fn test_checksum_known_ack() {
        // Ack with status Ok: EF01 FFFFFFFF 07 0003 00 000A
        assert_eq!(calculate(0x07, 0x0003, &[0x00]), 0x000A);
    }

    #[test]
    fn test_checksum_covers_kind_and_length() {
        assert_ne!(calculate(0x02, 4, &[1, 2]), calculate(0x08, 4, &[1, 2]));
        assert_ne!(calculate(0x02, 4, &[1, 2]), calculate(0x02, 5, &[1, 2]));
    }

    #[test]
    fn test_checksum_wraps() {
        // 0x02 + 0x01 + 0x02 + 256 * 0xFF = 65285, still below the wrap
        let payload = vec![0xFF; 256];
        assert_eq!(calculate(0x02, 0x0102, &payload), 65285);

        // 300 * 0xFF = 76500 wraps around 65536
        let payload = vec![0xFF; 300];
        let expected = ((0x02u32 + 0x01 + 0x2E + 300 * 0xFF) % 65536) as u16;
        assert_eq!(calculate(0x02, 0x012E, &payload), expected);
    }
}
