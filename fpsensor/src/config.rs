//! Sensor configuration

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use fpsensor_core::constants::{
    DEFAULT_ADDRESS, DEFAULT_PASSWORD, DEFAULT_READ_TIMEOUT, DEFAULT_SETTLE_DELAY_MS,
};

/// How long to keep polling for a finger
///
/// The default polls forever, yielding to the runtime between attempts.
#[derive(Debug, Clone, Default)]
pub struct WaitPolicy {
    max_attempts: Option<u32>,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl WaitPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up after this many `read_image` calls
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Pause between two polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Abort waiting when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Sensor configuration
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fpsensor::{SensorConfig, WaitPolicy};
///
/// let config = SensorConfig::default()
///     .with_password(0x1234)
///     .with_read_timeout(Duration::from_secs(2))
///     .with_wait(WaitPolicy::new().with_max_attempts(50));
///
/// assert_eq!(config.address, 0xFFFF_FFFF);
/// assert_eq!(config.wait.max_attempts(), Some(50));
/// ```
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Module address stamped into every frame
    pub address: u32,

    /// Handshake password
    pub password: u32,

    /// Bound on every single transport read
    pub read_timeout: Duration,

    /// Finger polling policy used by the workflows
    pub wait: WaitPolicy,

    /// Pause between the two captures of an enrollment
    pub settle_delay: Duration,
}

impl SensorConfig {
    pub fn with_address(mut self, address: u32) -> Self {
        self.address = address;
        self
    }

    pub fn with_password(mut self, password: u32) -> Self {
        self.password = password;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            password: DEFAULT_PASSWORD,
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT),
            wait: WaitPolicy::default(),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
        }
    }
}
