//! Device tuning

use std::time::Duration;

use ld2450_core::constants::{DEFAULT_BACKOFF, DEFAULT_COMMAND_ATTEMPTS, DEFAULT_RECONNECT_BACKOFF};

/// Timing and retry settings for a [`Device`](crate::Device)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOptions {
    /// Pause after a transient link error before dropping the link
    pub backoff: Duration,

    /// Pause between reconnect attempts while the device is not found
    pub reconnect_backoff: Duration,

    /// Times a command bracket is sent before giving up (at least 1)
    pub command_attempts: u32,
}

impl DeviceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    pub fn with_command_attempts(mut self, attempts: u32) -> Self {
        self.command_attempts = attempts.max(1);
        self
    }
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_BACKOFF,
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
            command_attempts: DEFAULT_COMMAND_ATTEMPTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_builder() {
        let options = DeviceOptions::default();
        assert_eq!(options.backoff, Duration::from_millis(250));
        assert_eq!(options.command_attempts, 3);

        let options = DeviceOptions::new()
            .with_backoff(Duration::from_millis(10))
            .with_command_attempts(0);
        assert_eq!(options.backoff, Duration::from_millis(10));
        assert_eq!(options.reconnect_backoff, Duration::from_millis(250));
        assert_eq!(options.command_attempts, 1);
    }
}
