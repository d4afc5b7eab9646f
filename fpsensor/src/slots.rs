//! Free template slot lookup

use tracing::debug;

use fpsensor_transport::Transport;
use fpsensor_types::{template::validate_position, TemplateIndex};

use crate::error::Result;
use crate::sensor::Sensor;

/// First unused slot of one index page, as an absolute position
///
/// # Examples
///
/// ```
/// use fpsensor::slots::first_free_slot;
///
/// assert_eq!(first_free_slot(0, &[true, true, false, true]), Some(2));
/// assert_eq!(first_free_slot(1, &[true, false, true, true]), Some(5));
/// assert_eq!(first_free_slot(0, &[true; 4]), None);
/// ```
pub fn first_free_slot(page: u8, flags: &[bool]) -> Option<usize> {
    flags
        .iter()
        .position(|used| !used)
        .map(|local| flags.len() * page as usize + local)
}

impl<T: Transport> Sensor<T> {
    /// Scan the index pages in order for the first unused slot
    ///
    /// Pages starting at or beyond `capacity` are not fetched.
    ///
    /// # Errors
    ///
    /// An invalid position error when every slot below `capacity` is used.
    pub async fn find_free_slot(&mut self, capacity: u16) -> Result<u16> {
        let mut entries_per_page = None;

        for page in 0..TemplateIndex::PAGES {
            if let Some(entries) = entries_per_page {
                if entries * page as usize >= capacity as usize {
                    break;
                }
            }

            let index = self.template_index(page).await?;
            entries_per_page = Some(index.entries());
            debug!("Index page {}: {}/{} used", page, index.used_count(), index.entries());

            if let Some(slot) = first_free_slot(page, index.flags()) {
                let slot = u16::try_from(slot).unwrap_or(u16::MAX);
                let slot = validate_position(slot, capacity)?;
                debug!("Free slot {} on page {}", slot, page);
                return Ok(slot);
            }

            if index.entries() == 0 {
                break;
            }
        }

        Err(fpsensor_types::Error::validation(format!(
            "Invalid position: no free slot below capacity {}",
            capacity
        ))
        .into())
    }
}
