//! Enrollment, search and capture workflows
//!
//! Each workflow drives several sensor commands and reports progress
//! through a `notify` callback. The finger-wait loops follow the sensor's
//! [`WaitPolicy`](crate::WaitPolicy).

use std::fmt;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use fpsensor_transport::Transport;
use fpsensor_types::{CharBuffer, FingerprintImage, TemplateMatch};

use crate::error::{Error, Result};
use crate::sensor::Sensor;

/// Progress of an enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollState {
    AwaitFirstCapture,
    Captured1,
    CheckExisting,
    AwaitSecondCapture,
    Captured2,
    Compare,
    Stored,
}

/// Outcome of a successful enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enrollment {
    /// A new template was stored at this position
    Enrolled(u16),

    /// The finger already matched the template at this position
    AlreadyEnrolled(u16),
}

impl Enrollment {
    pub fn position(self) -> u16 {
        match self {
            Self::Enrolled(position) | Self::AlreadyEnrolled(position) => position,
        }
    }
}

/// Messages for the person at the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    WaitingForFinger,
    RemoveFinger,
    WaitingForSameFinger,
    AlreadyEnrolled(u16),
    Enrolled(u16),
    NoMatch,
    Found(TemplateMatch),
    DownloadingImage,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForFinger => write!(f, "Waiting for finger..."),
            Self::RemoveFinger => write!(f, "Remove finger..."),
            Self::WaitingForSameFinger => write!(f, "Waiting for same finger again..."),
            Self::AlreadyEnrolled(position) => {
                write!(f, "Template already exists at position #{}", position)
            }
            Self::Enrolled(position) => {
                write!(f, "Finger enrolled successfully at template position {}", position)
            }
            Self::NoMatch => write!(f, "No match found!"),
            Self::Found(found) => write!(
                f,
                "Found template at position #{} with accuracy score of: {}",
                found.position, found.score
            ),
            Self::DownloadingImage => write!(f, "Downloading image (this takes a while)..."),
        }
    }
}

impl<T: Transport> Sensor<T> {
    /// Poll `read_image` until a finger is on the sensor
    ///
    /// # Errors
    ///
    /// - [`Error::Cancelled`] when the policy's token fires
    /// - [`Error::FingerNotDetected`] when the attempt budget runs out
    pub async fn wait_for_finger(&mut self) -> Result<()> {
        let policy = self.config.wait.clone();
        let cancel = policy.cancel_token();
        let mut attempts = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            attempts += 1;
            if self.read_image().await? {
                debug!("Finger detected after {} attempt(s)", attempts);
                return Ok(());
            }

            if let Some(max) = policy.max_attempts() {
                if attempts >= max {
                    return Err(Error::FingerNotDetected { attempts });
                }
            }

            let interval = policy.poll_interval();
            if interval.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(Error::Cancelled),
                    _ = sleep(interval) => {}
                }
            }
        }
    }

    /// Enroll a finger with two captures
    ///
    /// Returns early with [`Enrollment::AlreadyEnrolled`] if the first
    /// capture already matches a stored template. Nothing is written to the
    /// template store unless both captures match.
    ///
    /// # Errors
    ///
    /// - [`Error::FingersDoNotMatch`] when the captures score 0
    /// - [`Error::TemplateNotCreated`] when the sensor cannot combine them
    pub async fn enroll_fingerprint<F>(&mut self, mut notify: F) -> Result<Enrollment>
    where
        F: FnMut(Prompt) + Send,
    {
        let mut state = EnrollState::AwaitFirstCapture;
        debug!("Enrollment: {:?}", state);

        notify(Prompt::WaitingForFinger);
        self.wait_for_finger().await?;
        self.convert_image(CharBuffer::One).await?;
        state = advance(state, EnrollState::Captured1);

        state = advance(state, EnrollState::CheckExisting);
        if let Some(existing) = self.search_template(CharBuffer::One, 0, None).await? {
            info!("Finger already enrolled at position {}", existing.position);
            notify(Prompt::AlreadyEnrolled(existing.position));
            return Ok(Enrollment::AlreadyEnrolled(existing.position));
        }

        notify(Prompt::RemoveFinger);
        self.settle().await?;

        state = advance(state, EnrollState::AwaitSecondCapture);
        notify(Prompt::WaitingForSameFinger);
        self.wait_for_finger().await?;
        self.convert_image(CharBuffer::Two).await?;
        state = advance(state, EnrollState::Captured2);

        state = advance(state, EnrollState::Compare);
        if self.compare_characteristics().await? == 0 {
            warn!("Enrollment aborted: fingers do not match");
            return Err(Error::FingersDoNotMatch);
        }

        if !self.create_template().await? {
            warn!("Enrollment aborted: template could not be created");
            return Err(Error::TemplateNotCreated);
        }

        let position = self.store_template(None, CharBuffer::One).await?;
        advance(state, EnrollState::Stored);

        info!("Finger enrolled at position {}", position);
        notify(Prompt::Enrolled(position));
        Ok(Enrollment::Enrolled(position))
    }

    /// Capture a finger and search the whole store for it
    pub async fn search_fingerprint<F>(&mut self, mut notify: F) -> Result<Option<TemplateMatch>>
    where
        F: FnMut(Prompt) + Send,
    {
        notify(Prompt::WaitingForFinger);
        self.wait_for_finger().await?;
        self.convert_image(CharBuffer::One).await?;

        let found = self.search_template(CharBuffer::One, 0, None).await?;
        match found {
            Some(hit) => {
                info!("Finger matched template {}", hit);
                notify(Prompt::Found(hit));
            }
            None => {
                info!("Finger matched no template");
                notify(Prompt::NoMatch);
            }
        }

        Ok(found)
    }

    /// Capture a finger and download the raw image
    pub async fn capture_image<F>(&mut self, mut notify: F) -> Result<FingerprintImage>
    where
        F: FnMut(Prompt) + Send,
    {
        notify(Prompt::WaitingForFinger);
        self.wait_for_finger().await?;

        notify(Prompt::DownloadingImage);
        let image = self.download_image().await?;

        info!("Captured {}x{} image", image.width(), image.height());
        Ok(image)
    }

    /// Delete the template at `position`
    pub async fn delete_fingerprint(&mut self, position: u16) -> Result<bool> {
        self.delete_template(position, 1).await
    }

    async fn settle(&self) -> Result<()> {
        let delay = self.config.settle_delay;
        let cancel = self.config.wait.cancel_token();

        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = sleep(delay) => Ok(()),
        }
    }
}

fn advance(from: EnrollState, to: EnrollState) -> EnrollState {
    debug!("Enrollment: {:?} -> {:?}", from, to);
    to
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrollment_position() {
        assert_eq!(Enrollment::Enrolled(3).position(), 3);
        assert_eq!(Enrollment::AlreadyEnrolled(7).position(), 7);
    }

    #[test]
    fn test_prompt_messages() {
        assert_eq!(Prompt::RemoveFinger.to_string(), "Remove finger...");
        assert_eq!(
            Prompt::AlreadyEnrolled(4).to_string(),
            "Template already exists at position #4"
        );
        assert_eq!(
            Prompt::Found(TemplateMatch { position: 5, score: 100 }).to_string(),
            "Found template at position #5 with accuracy score of: 100"
        );
    }
}
