//! Raw fingerprint image buffer

use bytes::Bytes;

use crate::error::{Error, Result};

/// A captured fingerprint image as sent by the sensor.
///
/// Pixels are 4-bit grey values packed two per byte, high nibble first,
/// row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintImage {
    data: Bytes,
}

impl FingerprintImage {
    pub const WIDTH: usize = 256;
    pub const HEIGHT: usize = 288;

    /// Size of the packed pixel data in bytes
    pub const DATA_SIZE: usize = Self::WIDTH * Self::HEIGHT / 2;

    pub fn from_raw(data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.len() != Self::DATA_SIZE {
            return Err(Error::parse(format!(
                "Image data must be {} bytes, got {}",
                Self::DATA_SIZE,
                data.len()
            )));
        }
        Ok(Self { data })
    }

    pub fn width(&self) -> usize {
        Self::WIDTH
    }

    pub fn height(&self) -> usize {
        Self::HEIGHT
    }

    /// Packed 4-bit pixel data
    pub fn raw(&self) -> &Bytes {
        &self.data
    }

    /// 4-bit value of the pixel at (x, y), or `None` outside the image
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= Self::WIDTH || y >= Self::HEIGHT {
            return None;
        }
        let index = y * Self::WIDTH + x;
        let byte = self.data[index / 2];
        Some(if index % 2 == 0 { byte >> 4 } else { byte & 0x0F })
    }

    /// Widen to one 8-bit grey byte per pixel (0x0 → 0x00, 0xF → 0xFF)
    pub fn to_gray8(&self) -> Vec<u8> {
        self.data
            .iter()
            .flat_map(|byte| [(byte >> 4) * 17, (byte & 0x0F) * 17])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_image_size_checked() {
        assert!(FingerprintImage::from_raw(vec![0u8; 100]).is_err());
        assert!(FingerprintImage::from_raw(vec![0u8; FingerprintImage::DATA_SIZE]).is_ok());
    }

    #[test]
    fn test_pixel_nibbles() {
        let mut data = vec![0u8; FingerprintImage::DATA_SIZE];
        data[0] = 0xA5;
        let image = FingerprintImage::from_raw(data).unwrap();

        assert_eq!(image.pixel(0, 0), Some(0x0A));
        assert_eq!(image.pixel(1, 0), Some(0x05));
        assert_eq!(image.pixel(256, 0), None);
        assert_eq!(image.pixel(0, 288), None);
    }

    #[test]
    fn test_to_gray8() {
        let mut data = vec![0u8; FingerprintImage::DATA_SIZE];
        data[1] = 0xF0;
        let image = FingerprintImage::from_raw(data).unwrap();
        let gray = image.to_gray8();

        assert_eq!(gray.len(), FingerprintImage::WIDTH * FingerprintImage::HEIGHT);
        assert_eq!(&gray[..4], &[0x00, 0x00, 0xFF, 0x00]);
    }
}
