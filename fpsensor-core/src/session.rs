//! Session management for the sensor protocol
//!
//! A session represents the host's view of one sensor and tracks:
//! - Module address (stamped into every frame)
//! - Module password (sent during the handshake)
//! - Handshake state

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::constants::{DEFAULT_ADDRESS, DEFAULT_PASSWORD};
use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Password not verified yet
    Uninitialized,

    /// Password verified, ready for commands
    Verified,
}

/// Session manager
///
/// Thread-safe and can be cloned cheaply (Arc internally).
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    address: AtomicU32,
    password: AtomicU32,
    state: parking_lot::RwLock<SessionState>,
}

impl Session {
    /// Create an uninitialized session
    pub fn new(address: u32, password: u32) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                address: AtomicU32::new(address),
                password: AtomicU32::new(password),
                state: parking_lot::RwLock::new(SessionState::Uninitialized),
            }),
        }
    }

    pub fn address(&self) -> u32 {
        self.inner.address.load(Ordering::Acquire)
    }

    pub fn password(&self) -> u32 {
        self.inner.password.load(Ordering::Acquire)
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        *self.inner.state.read()
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.state(), SessionState::Verified)
    }

    /// Mark the password handshake as done
    pub fn mark_verified(&self) -> Result<()> {
        let mut state = self.inner.state.write();

        if *state != SessionState::Uninitialized {
            return Err(Error::InvalidSessionState(format!(
                "Cannot verify from state: {:?}",
                *state
            )));
        }

        *state = SessionState::Verified;
        Ok(())
    }

    /// Fail unless the handshake has completed
    pub fn ensure_verified(&self) -> Result<()> {
        if self.is_verified() {
            Ok(())
        } else {
            Err(Error::SessionNotInitialized)
        }
    }

    /// Record an address the sensor has acknowledged
    pub fn set_address(&self, address: u32) {
        self.inner.address.store(address, Ordering::Release);
    }

    /// Record a password the sensor has acknowledged
    pub fn set_password(&self, password: u32) {
        self.inner.password.store(password, Ordering::Release);
    }

    /// Drop back to `Uninitialized`, keeping address and password
    pub fn reset(&self) {
        *self.inner.state.write() = SessionState::Uninitialized;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_ADDRESS, DEFAULT_PASSWORD)
    }
}
