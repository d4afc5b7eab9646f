//! Template store types

use std::fmt;

use crate::error::{Error, Result};

/// One of the two sensor-side characteristics registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CharBuffer {
    #[default]
    One = 0x01,
    Two = 0x02,
}

impl From<CharBuffer> for u8 {
    fn from(buffer: CharBuffer) -> u8 {
        buffer as u8
    }
}

impl TryFrom<u8> for CharBuffer {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::One),
            0x02 => Ok(Self::Two),
            _ => Err(Error::validation(format!("Invalid char buffer: {}", value))),
        }
    }
}

impl fmt::Display for CharBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CharBuffer{}", *self as u8)
    }
}

/// A search hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateMatch {
    /// Slot of the matching template
    pub position: u16,

    /// Match confidence reported by the sensor
    pub score: u16,
}

impl TemplateMatch {
    /// `(position, score)`, or `(-1, -1)` when nothing matched
    pub fn as_pair(found: Option<Self>) -> (i32, i32) {
        match found {
            Some(hit) => (hit.position as i32, hit.score as i32),
            None => (-1, -1),
        }
    }
}

impl fmt::Display for TemplateMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} (score {})", self.position, self.score)
    }
}

/// Usage flags of one page of the template index table.
///
/// Each byte of the sensor's bitmap covers eight slots, least significant
/// bit first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateIndex {
    page: u8,
    used: Vec<bool>,
}

impl TemplateIndex {
    /// Number of index pages the sensor exposes
    pub const PAGES: u8 = 4;

    pub fn new(page: u8, used: Vec<bool>) -> Result<Self> {
        validate_page(page)?;
        Ok(Self { page, used })
    }

    /// Expand a bitmap returned by the sensor
    pub fn from_bitmap(page: u8, bitmap: &[u8]) -> Result<Self> {
        let used = bitmap
            .iter()
            .flat_map(|byte| (0..8).map(move |bit| byte & (1 << bit) != 0))
            .collect();
        Self::new(page, used)
    }

    pub fn page(&self) -> u8 {
        self.page
    }

    /// Slots covered by this page
    pub fn entries(&self) -> usize {
        self.used.len()
    }

    pub fn flags(&self) -> &[bool] {
        &self.used
    }

    pub fn used_count(&self) -> usize {
        self.used.iter().filter(|used| **used).count()
    }
}

pub fn validate_page(page: u8) -> Result<u8> {
    if page >= TemplateIndex::PAGES {
        return Err(Error::validation(format!("Invalid index page: {}", page)));
    }
    Ok(page)
}

/// Checks `0 <= position < capacity`
pub fn validate_position(position: u16, capacity: u16) -> Result<u16> {
    if position >= capacity {
        return Err(Error::validation(format!(
            "Invalid position: {} (capacity {})",
            position, capacity
        )));
    }
    Ok(position)
}

/// Checks a delete range fits in the store
pub fn validate_range(position: u16, count: u16, capacity: u16) -> Result<()> {
    validate_position(position, capacity)?;
    if count > capacity - position {
        return Err(Error::validation(format!(
            "Invalid count: {} templates from position {} (capacity {})",
            count, position, capacity
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_char_buffer_conversion() {
        assert_eq!(u8::from(CharBuffer::One), 1);
        assert_eq!(CharBuffer::try_from(2).unwrap(), CharBuffer::Two);
        assert!(CharBuffer::try_from(0).is_err());
        assert!(CharBuffer::try_from(3).is_err());
    }

    #[test]
    fn test_template_index_bit_order() {
        // 0b0000_0101: slots 0 and 2 used, low bit first
        let index = TemplateIndex::from_bitmap(0, &[0x05, 0x80]).unwrap();

        assert_eq!(index.entries(), 16);
        assert_eq!(&index.flags()[..4], &[true, false, true, false]);
        assert!(index.flags()[15]);
        assert_eq!(index.used_count(), 3);
    }

    #[test]
    fn test_template_index_full_page() {
        let index = TemplateIndex::from_bitmap(2, &[0u8; 32]).unwrap();
        assert_eq!(index.entries(), 256);
        assert_eq!(index.page(), 2);
        assert_eq!(index.used_count(), 0);
    }

    #[test]
    fn test_template_index_invalid_page() {
        assert!(matches!(TemplateIndex::from_bitmap(4, &[0]), Err(Error::Validation(_))));
    }

    #[test]
    fn test_match_pair() {
        let hit = TemplateMatch { position: 5, score: 100 };
        assert_eq!(TemplateMatch::as_pair(Some(hit)), (5, 100));
        assert_eq!(TemplateMatch::as_pair(None), (-1, -1));
    }

    #[test]
    fn test_validate_position_and_range() {
        assert!(validate_position(0, 150).is_ok());
        assert!(validate_position(150, 150).is_err());

        assert!(validate_range(140, 10, 150).is_ok());
        assert!(validate_range(140, 11, 150).is_err());
        assert!(validate_range(150, 0, 150).is_err());
    }
}
